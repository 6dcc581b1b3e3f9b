//! Vellum - Template Engine
//!
//! Templates are markup with `{}` interpolations and namespaced helper tags:
//!
//! ```
//! use vellum::{Engine, Store};
//! use serde_json::json;
//!
//! let engine = Engine::default();
//! let template = engine
//!     .compile(r#"<f:for each="{users}" as="user">{user.name}; </f:for>"#)
//!     .unwrap();
//! let store = Store::new().with_must("users", json!([{"name": "Taylor"}, {"name": "Casey"}]));
//!
//! assert_eq!(engine.render(&template, &store).unwrap(), "Taylor; Casey; ");
//! ```
pub mod compile;
pub mod helper;
pub mod render;
pub mod report;
pub mod scan;
pub mod source;

mod engine;
mod pipe;
mod region;
mod resolver;
mod settings;
mod value;

pub use compile::{compile, Template};
pub use engine::Engine;
pub use pipe::to_text;
pub use region::Region;
pub use render::{render, Store};
pub use report::{Error, ErrorKind};
pub use resolver::Resolver;
pub use settings::Settings;
pub use value::{Map, Object, Property, Value};
