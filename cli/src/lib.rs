//! Command-line driver for the cobuy recommender.
//!
//! Every command works on one data directory laid out like this:
//!
//! ```text
//! data/
//!   products.json         catalog (input)
//!   interactions.json     interaction log (input)
//!   neighbors.json        precomputed similarity neighbors (optional input)
//!   embeddings.json       product embeddings (optional input)
//!   co_occurrence.json    written by `cobuy build`
//!   lift_scores.json      written by `cobuy build`
//!   recommendations.json  written by `cobuy batch`
//! ```

mod cobuy_cmd;
mod data;

pub use cobuy_cmd::{BatchArgs, CobuyCli, CobuyCommand, RecommendArgs, ScoringArgs};
pub use data::{DataDir, IndexSource, LoadedIndex};
