//! Technology mapping onto K-input lookup tables.
//!
//! Mapping starts from a subject graph: a network of two-input gates, read through the [`traits::SubjectGraph`]
//! trait. Something outside this crate decides, for each gate, which [`cut::Cut`] should implement it: a set of
//! leaves further back in the network and the Boolean function of those leaves that the gate computes. A
//! [`map_record::MapRecord`] holds that choice and turns it into a [`lngraph::LnGraph`], a network of lookup tables,
//! flip-flops and I/O.
//!
//! Choosing cuts well takes many trials, so the mapping record can also estimate how many LUTs an assignment would
//! produce without building anything. The estimate agrees exactly with the number of LUTs reconstruction builds.
//!
//! Working backwards from each output, a LUT is built for every node needed at a given polarity, once. An output
//! that needs the inverse of a primary input gets a one-input inverter LUT; an output tied to a constant gets a
//! zero-input LUT.
//!
//! [`sbj::SbjGraph`] is an and-inverter graph implementing the subject graph trait, readable from ASCII AIGER files.
//! The LUT network can be written out as a listing or as Verilog with [`lngraph_dump`].

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod cut;
pub mod error;
mod id_mgr;
pub mod lngraph;
pub mod lngraph_dump;
pub mod logexpr;
pub mod map_record;
pub mod sbj;
pub mod traits;
