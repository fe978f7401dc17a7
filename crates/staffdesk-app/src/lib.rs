// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod catalog;
pub mod columns;
pub mod filter;
pub mod ids;
pub mod model;
pub mod state;
pub mod sync;
pub mod table;
pub mod validation;
pub mod widgets;

pub use catalog::*;
pub use columns::*;
pub use filter::*;
pub use ids::*;
pub use model::*;
pub use state::*;
pub use sync::*;
pub use table::*;
pub use validation::*;
pub use widgets::*;
