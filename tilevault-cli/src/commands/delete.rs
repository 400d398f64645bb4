//! Delete command - cascading delete by coordinate key.

use std::path::Path;

use tilevault::resolver::DeleteError;
use tilevault::transfer::DrainPolicy;

use crate::error::CliError;

/// Run the delete command.
pub async fn run(root: &Path, keys: Vec<String>) -> Result<(), CliError> {
    let mut session = super::open_session(root, DrainPolicy::default()).await?;

    match session.delete_selected(&keys).await {
        Ok(removed) => {
            println!("Deleted {} tiles", removed.len());
            for record in &removed {
                println!("  {}", record.file_name);
            }
            Ok(())
        }
        Err(DeleteError::NothingToDelete) => {
            println!("Nothing valid to delete");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
