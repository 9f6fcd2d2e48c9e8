use datafusion::execution::context::SessionContext;
use datafusion::prelude::SessionConfig;

/// Creates the DataFusion context every pipeline stage runs on.
///
/// Listing must descend into subdirectories: the source datasets are laid out
/// hierarchically and partitioned output is read back through `key=value`
/// directories.
pub fn new_session_context(target_partitions: Option<usize>) -> SessionContext {
    let mut config = SessionConfig::new().with_information_schema(false);
    config
        .options_mut()
        .execution
        .listing_table_ignore_subdirectory = false;

    if let Some(partitions) = target_partitions.filter(|n| *n > 0) {
        config = config.with_target_partitions(partitions);
    }

    SessionContext::new_with_config(config)
}
