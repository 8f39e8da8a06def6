pub mod app;
pub mod components;
pub mod session;
pub mod tabs;
pub mod theme;
