use std::env;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use folio::config;
use folio::engine::FileEngine;
use folio::kernel::{Action, AppState, PluginRegistry};
use folio::plugins::{
    AnnotatePlugin, InteractionPlugin, LoaderPlugin, PanPlugin, SelectPlugin, ZoomPlugin,
};

fn main() -> io::Result<()> {
    let _logging = folio::logging::init();
    let config = config::load_config();
    if let Err(error) = config::ensure_config_file() {
        tracing::warn!(%error, "cannot create config file");
    }

    let engine = Arc::new(FileEngine::new(config.lines_per_page)?);

    let mut registry = PluginRegistry::new(AppState::new());
    register(&mut registry, Box::new(InteractionPlugin::new()), &config)?;
    register(&mut registry, Box::new(LoaderPlugin::new(engine)), &config)?;
    register(&mut registry, Box::new(PanPlugin::new()), &config)?;
    register(&mut registry, Box::new(SelectPlugin::new()), &config)?;
    register(&mut registry, Box::new(AnnotatePlugin::new()), &config)?;
    register(&mut registry, Box::new(ZoomPlugin::new()), &config)?;
    registry.initialize().map_err(io::Error::other)?;

    if config.default_mode != folio::kernel::interaction::DEFAULT_MODE {
        registry.dispatch(Action::SetDefaultMode {
            mode: config.default_mode.as_str().into(),
        });
    }

    let path = env::args().nth(1).map(PathBuf::from);
    folio::tui::run(registry, path)
}

fn register(
    registry: &mut PluginRegistry,
    plugin: Box<dyn folio::kernel::Plugin>,
    config: &config::Config,
) -> io::Result<()> {
    let id = plugin.descriptor().id;
    // The interaction and loader plugins are the runtime itself; only tool
    // plugins honor the disabled list.
    let core = id == folio::plugins::interaction::PLUGIN_ID
        || id == folio::plugins::loader::PLUGIN_ID;
    if !core && config.disabled_plugins.iter().any(|disabled| *disabled == id) {
        tracing::info!(plugin = %id, "disabled by config");
        return Ok(());
    }
    registry.register(plugin).map_err(io::Error::other)
}
