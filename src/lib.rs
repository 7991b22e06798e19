//! Votelist: permission-scoped voter views and asynchronous reports
//!
//! Browse a voter roll through user-configurable column and filter views,
//! keep them as saved lists, and queue printable reports that an
//! out-of-process worker renders.

pub mod cli;
pub mod core;
pub mod entities;
pub mod logging;
pub mod worker;
