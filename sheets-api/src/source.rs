use std::future::Future;
use std::sync::Arc;

use anyhow::Result;

use crate::table::Table;

/// Anything that can hand back a whole worksheet as a [`Table`]. Authentication failures, missing
/// worksheets and transport errors all surface as the same single `Err`.
pub trait TableSource: Send + Sync {
    fn read_table(&self, worksheet: &str) -> impl Future<Output = Result<Table>> + Send;
}

impl<T: TableSource> TableSource for Arc<T> {
    fn read_table(&self, worksheet: &str) -> impl Future<Output = Result<Table>> + Send {
        (**self).read_table(worksheet)
    }
}
