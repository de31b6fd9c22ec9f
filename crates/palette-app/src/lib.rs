// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod canned;
pub mod catalog;
pub mod filter;
pub mod model;
pub mod page;
pub mod source;
pub mod state;

pub use canned::*;
pub use catalog::*;
pub use filter::*;
pub use model::*;
pub use page::*;
pub use source::*;
pub use state::*;
