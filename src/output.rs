//! one csv file per metric group, opened on first use

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use eyre::{Context, Result};
use tracing::info;

#[derive(Debug)]
pub struct OutputSet {
    output_dir: PathBuf,
    files: BTreeMap<String, BufWriter<File>>,
}

impl OutputSet {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)
            .wrap_err(format!("cannot create output dir {:?}", output_dir))?;
        Ok(Self {
            output_dir,
            files: BTreeMap::new(),
        })
    }

    pub fn path_of(&self, group: &str) -> PathBuf {
        self.output_dir.join(format!("{group}.csv"))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// the writer of `group`, the file is created the first time
    pub fn get(&mut self, group: &str) -> Result<&mut BufWriter<File>> {
        if !self.files.contains_key(group) {
            let path = self.path_of(group);
            let file =
                File::create(&path).wrap_err(format!("the path: {:?} is invalid!", path))?;
            info!("{} statistics are written to {:?}", group, path);
            self.files.insert(group.to_string(), BufWriter::new(file));
        }
        self.files
            .get_mut(group)
            .ok_or(eyre::eyre!("no output file for {}", group))
    }

    pub fn write_to_all(&mut self, groups: &[&str], content: &str) -> Result<()> {
        for group in groups {
            self.get(group)?.write_all(content.as_bytes())?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        for file in self.files.values_mut() {
            file.flush()?;
        }
        Ok(())
    }
}
