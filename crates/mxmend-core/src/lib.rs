//! mxmend Core Types and Definitions
//!
//! This crate provides the owned document model shared by the mxmend
//! crates. It includes:
//!
//! - **Document**: an arena of cells with id lookup ([`document::Document`])
//! - **Cells**: vertices, edges and containers ([`cell::Cell`])
//! - **Geometry**: geometry and point values ([`geometry`] module)
//! - **Style**: normalized `key=value;` style maps ([`style::Style`])
//! - **XML**: escaping and serialization helpers ([`xml`] module)

pub mod attributes;
pub mod cell;
pub mod document;
pub mod element;
pub mod geometry;
pub mod style;
pub mod xml;
