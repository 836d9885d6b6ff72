//! Result materialization and views.

mod materializer;
mod view;

pub use materializer::{materialize, AttributeOrder, MaterializeError, LABEL_SEPARATOR};
pub use view::{PossibleValuesView, QueryResultItem, QueryResultsView};
