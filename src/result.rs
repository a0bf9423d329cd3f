use std::path::Path;

use eyre::{Context, Result};
use serde::Serialize;

/// save the finished and failed runs next to `filename`,
/// as `<filename>.ok.json` and `<filename>.err.json`
pub fn save_result_list<T: Serialize>(ok_list: &[T], err_list: &[T], filename: &Path) -> Result<()> {
    // create dir first
    if let Some(parent) = filename.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::File::create(filename.with_extension("ok.json"))
        .wrap_err("fail to create ok list")?;
    serde_json::to_writer_pretty(&mut file, ok_list).wrap_err("fail to write ok list")?;
    let mut file = std::fs::File::create(filename.with_extension("err.json"))
        .wrap_err("fail to create err list")?;
    serde_json::to_writer_pretty(&mut file, err_list).wrap_err("fail to write err list")?;
    Ok(())
}
