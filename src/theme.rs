use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    // Accepts `#rrggbb`, `rrggbb` or the short `#rgb` form.
    pub fn parse_hex(raw: &str) -> Option<Self> {
        let hex = raw.trim().trim_start_matches('#');
        let digits: Vec<u8> = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<_>>()?;
        match digits.as_slice() {
            [r, g, b] => Some(Self::new(r * 17, g * 17, b * 17)),
            [r1, r0, g1, g0, b1, b0] => Some(Self::new(
                r1 * 16 + r0,
                g1 * 16 + g0,
                b1 * 16 + b0,
            )),
            _ => None,
        }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub foreground: Rgb,
    pub background: Rgb,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            foreground: Rgb::new(0xf2, 0xe8, 0xd5),
            background: Rgb::new(0x10, 0x12, 0x1a),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ThemeError {
    Io(String),
    Parse { line: usize, message: String },
    InvalidColor { field: &'static str, value: String },
}

impl fmt::Display for ThemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Parse { line, message } => write!(f, "parse error at line {line}: {message}"),
            Self::InvalidColor { field, value } => {
                write!(f, "invalid color for {field}: '{value}' (expected #rrggbb)")
            }
        }
    }
}

impl std::error::Error for ThemeError {}

impl Theme {
    pub fn load(path: &Path) -> Result<Self, ThemeError> {
        let text = std::fs::read_to_string(path).map_err(|e| ThemeError::Io(e.to_string()))?;
        Self::parse(&text)
    }

    // `foreground=` / `background=` lines; either may be omitted and keeps
    // its default.
    pub fn parse(text: &str) -> Result<Self, ThemeError> {
        let mut theme = Self::default();
        for (line_idx, raw) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (key, value) = trimmed.split_once('=').ok_or(ThemeError::Parse {
                line: line_no,
                message: "expected <key>=<value>".to_string(),
            })?;
            match key.trim() {
                "foreground" | "fg" => theme.foreground = color("foreground", value)?,
                "background" | "bg" => theme.background = color("background", value)?,
                other => {
                    return Err(ThemeError::Parse {
                        line: line_no,
                        message: format!("unknown key '{other}'"),
                    });
                }
            }
        }
        Ok(theme)
    }

    pub fn with_overrides(
        mut self,
        fg: Option<&str>,
        bg: Option<&str>,
    ) -> Result<Self, ThemeError> {
        if let Some(v) = fg {
            self.foreground = color("foreground", v)?;
        }
        if let Some(v) = bg {
            self.background = color("background", v)?;
        }
        Ok(self)
    }
}

fn color(field: &'static str, value: &str) -> Result<Rgb, ThemeError> {
    Rgb::parse_hex(value).ok_or_else(|| ThemeError::InvalidColor {
        field,
        value: value.trim().to_string(),
    })
}
