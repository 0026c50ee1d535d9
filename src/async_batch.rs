//! Async batch processing module
//!
//! This module converts many GRD files concurrently. Each file is decoded on
//! its own blocking task, so one file's failure or cancellation never touches
//! another.

#[cfg(feature = "async")]
/// Concurrent GRD conversion with a configurable concurrency limit
pub mod processor {
    use crate::batch::convert_grd_to_png;
    use crate::grd::{decode_grd, DecodedImage};
    use crate::{GrdPacError, Result};
    use futures::stream::{self, StreamExt};
    use log::warn;
    use std::collections::HashMap;
    use std::io;
    use std::path::{Path, PathBuf};

    /// Concurrent file processor
    #[derive(Debug, Clone)]
    pub struct AsyncBatchProcessor {
        concurrency_limit: usize,
        overwrite: bool,
    }

    impl AsyncBatchProcessor {
        /// Create a new batch processor with one task per CPU
        pub fn new() -> Self {
            Self {
                concurrency_limit: num_cpus::get(),
                overwrite: false,
            }
        }

        /// Set the concurrency limit
        pub fn with_concurrency(mut self, limit: usize) -> Self {
            self.concurrency_limit = limit.max(1);
            self
        }

        /// Replace existing output files instead of refusing them
        pub fn with_overwrite(mut self, overwrite: bool) -> Self {
            self.overwrite = overwrite;
            self
        }

        /// Current concurrency limit
        pub fn concurrency(&self) -> usize {
            self.concurrency_limit
        }

        /// Decode every file, returning one result per input in completion order
        pub async fn decode_files<P: AsRef<Path>>(
            &self,
            files: Vec<P>,
        ) -> Vec<(PathBuf, Result<DecodedImage>)> {
            stream::iter(files.into_iter().map(|path| {
                let path = path.as_ref().to_path_buf();
                async move {
                    let result = decode_single_file(path.clone()).await;
                    (path, result)
                }
            }))
            .buffer_unordered(self.concurrency_limit)
            .collect()
            .await
        }

        /// Convert every file to a PNG of the same stem inside `output_dir`
        ///
        /// Targets are assigned before any task starts. An input whose target
        /// was already claimed by an earlier input, or that exists on disk
        /// without overwrite, fails with `AlreadyExists` and is not converted.
        pub async fn convert_files<P: AsRef<Path>>(
            &self,
            files: Vec<P>,
            output_dir: &Path,
        ) -> Vec<(PathBuf, Result<PathBuf>)> {
            let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
            let mut refused = Vec::new();
            let mut jobs = Vec::new();

            for path in files {
                let input = path.as_ref().to_path_buf();
                let output = output_dir
                    .join(input.file_name().unwrap_or_default())
                    .with_extension("png");

                let conflict = if let Some(first) = claimed.get(&output) {
                    Some(format!(
                        "{} is also the target of {}",
                        output.display(),
                        first.display()
                    ))
                } else if !self.overwrite && output.exists() {
                    Some(format!("{} exists", output.display()))
                } else {
                    None
                };

                match conflict {
                    Some(reason) => {
                        warn!("not converting {}: {reason}", input.display());
                        let err = io::Error::new(io::ErrorKind::AlreadyExists, reason);
                        refused.push((input, Err(GrdPacError::Io(err))));
                    }
                    None => {
                        claimed.insert(output.clone(), input.clone());
                        jobs.push((input, output));
                    }
                }
            }

            let mut results: Vec<(PathBuf, Result<PathBuf>)> =
                stream::iter(jobs.into_iter().map(|(input, output)| async move {
                    let result = run_blocking({
                        let (input, output) = (input.clone(), output.clone());
                        move || convert_grd_to_png(input, output)
                    })
                    .await
                    .map(|()| output);
                    if let Err(e) = &result {
                        warn!("failed to convert {}: {e}", input.display());
                    }
                    (input, result)
                }))
                .buffer_unordered(self.concurrency_limit)
                .collect()
                .await;

            results.extend(refused);
            results
        }
    }

    impl Default for AsyncBatchProcessor {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Read and decode one file off the async runtime
    async fn decode_single_file(path: PathBuf) -> Result<DecodedImage> {
        let data = tokio::fs::read(&path).await?;
        run_blocking(move || decode_grd(&data)).await
    }

    async fn run_blocking<T, F>(f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        tokio::task::spawn_blocking(f).await.map_err(|e| {
            GrdPacError::Io(std::io::Error::new(std::io::ErrorKind::Interrupted, e))
        })?
    }
}

#[cfg(feature = "async")]
pub use processor::AsyncBatchProcessor;
