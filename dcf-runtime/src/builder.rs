use dcf_bridge::{Bridge, EventEmitter, LayoutDefaults, LayoutEngine, NoopLayout, event_channel};
use dcf_vdom::{Component, ComponentRegistry, Registry};

use crate::engine::Engine;

/// Engine log verbosity, applied to the global `log` filter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    fn filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
        }
    }
}

/// Configures and builds an [`Engine`].
/// ```
/// # use dcf_runtime::Engine;
/// # use dcf_bridge::testing::TestBridge;
/// let engine = Engine::builder(TestBridge::new()).finish();
/// ```
pub struct EngineBuilder<B> {
    pub(crate) bridge: B,
    pub(crate) layout: Box<dyn LayoutEngine>,
    pub(crate) layout_defaults: LayoutDefaults,
    pub(crate) components: ComponentRegistry,
    pub(crate) registry: Registry,
    pub(crate) emitter: EventEmitter,
    pub(crate) system: std::rc::Rc<dcf_state::Store<u64>>,
    events_rx: flume::Receiver<dcf_bridge::BridgeEvent>,

    pub(crate) frame_budget_ms: u64,
    pub(crate) worker_pool_size: usize,
    pub(crate) isolate_threshold_nodes: usize,
    log_level: Option<LogLevel>,
}

impl<B: Bridge> EngineBuilder<B> {
    pub(crate) fn new(bridge: B) -> Self {
        let (emitter, events_rx) = event_channel();

        Self {
            bridge,
            layout: Box::new(NoopLayout::default()),
            layout_defaults: LayoutDefaults::default(),
            components: ComponentRegistry::new(),
            registry: Registry::new(),
            emitter,
            system: std::rc::Rc::new(dcf_state::Store::new(0u64)),
            events_rx,

            frame_budget_ms: 16,
            worker_pool_size: 0,
            isolate_threshold_nodes: 50,
            log_level: None,
        }
    }

    /// Register a component type under its type name.
    pub fn register_component(&mut self, name: impl Into<String>, component: impl Component + 'static) -> &mut Self {
        self.components.register(name, component);
        self
    }

    /// The extension registry: prop-diff interceptors, reconciliation
    /// handlers, lifecycle interceptors, state-change handlers and
    /// hook factories.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn layout_engine(&mut self, layout: impl LayoutEngine + 'static) -> &mut Self {
        self.layout = Box::new(layout);
        self
    }

    /// Layout default overrides forwarded to the layout engine.
    pub fn web_defaults(&mut self, defaults: LayoutDefaults) -> &mut Self {
        self.layout_defaults = defaults;
        self
    }

    /// Scheduler frame budget in milliseconds (default 16).
    pub fn frame_budget_ms(&mut self, budget: u64) -> &mut Self {
        self.frame_budget_ms = budget;
        self
    }

    /// Number of reconciliation workers (default 0, pool disabled).
    pub fn worker_pool_size(&mut self, size: usize) -> &mut Self {
        self.worker_pool_size = size.min(4);
        self
    }

    /// Child-list width at which prop comparison is offloaded to the
    /// worker pool (default 50).
    pub fn isolate_threshold_nodes(&mut self, threshold: usize) -> &mut Self {
        self.isolate_threshold_nodes = threshold;
        self
    }

    pub fn log_level(&mut self, level: LogLevel) -> &mut Self {
        self.log_level = Some(level);
        self
    }

    /// Sender half of the inbound event channel, for native glue and
    /// tests.
    pub fn emitter(&self) -> EventEmitter {
        self.emitter.clone()
    }

    /// Shared handle to the system store, for components that depend
    /// on system state (font scale, language, theme, accessibility).
    pub fn system_store(&self) -> std::rc::Rc<dcf_state::Store<u64>> {
        self.system.clone()
    }

    pub fn finish(self) -> Engine<B> {
        if let Some(level) = self.log_level {
            log::set_max_level(level.filter());
        }

        let events_rx = self.events_rx.clone();
        Engine::from_builder(self, events_rx)
    }
}
