//! Tool plugins wired through the runtime. Each one talks to the rest of
//! the viewer only via the registry (actions/effects) and the interaction
//! manager's capability surface.

pub mod annotate;
pub mod interaction;
pub mod loader;
pub mod pan;
pub mod selection;
pub mod zoom;

pub use annotate::AnnotatePlugin;
pub use interaction::InteractionPlugin;
pub use loader::{DocumentTasks, LoaderPlugin};
pub use pan::PanPlugin;
pub use selection::SelectPlugin;
pub use zoom::ZoomPlugin;
