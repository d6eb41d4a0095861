pub mod animator;
pub mod app;
pub mod capture;
pub mod clock;
pub mod config;
pub mod keyframes;
pub mod logging;
pub mod playback;
pub mod render;
pub mod spring;
pub mod terminal;
pub mod theme;
pub mod tuning;
pub mod visual;
