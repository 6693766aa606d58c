//! Umbrella crate re-exporting the engine surface.
//!
//! Most applications want [`runtime::Engine`], the node constructors
//! in [`vdom`], and [`state::Store`].

pub use dcf_bridge as bridge;
pub use dcf_runtime as runtime;
pub use dcf_state as state;
pub use dcf_store as store;
pub use dcf_vdom as vdom;

pub mod prelude {
    pub use dcf_bridge::{Bridge, BridgeEvent, EventEmitter, LayoutDefaults, LayoutEngine, Op, SystemChange};
    pub use dcf_runtime::{Engine, EngineBuilder, LogLevel};
    pub use dcf_state::{Obj, Store, StoreSetter, StoreValue};
    pub use dcf_vdom::{
        Boundary, Color, Component, ComponentNode, Element, Fragment, Handler, Hooks, Memoized, Node, NodeKey, Portal,
        Priority, PropValue, Props,
    };
}
