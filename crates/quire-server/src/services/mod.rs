//! Services layer

pub mod auth;
pub mod bookmarks;
pub mod content;
pub mod fragments;
pub mod markup;
pub mod media;
pub mod renderer;
pub mod slugs;

pub use auth::AuthService;
pub use bookmarks::TitleFetcher;
pub use content::{ContentService, Upload};
pub use fragments::FragmentCache;
pub use media::MediaStore;
pub use renderer::{ContentRenderer, RenderSettings};
