//! Model management for the binary: fetch the ONNX model and tokenizer into
//! the local cache.

use std::path::Path;

use anyhow::{Context, Result};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::AsyncWriteExt;

use tramvia::config::{expand_tilde, EmbeddingConfig};

const HF_REPO: &str = "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

/// Files the local backend expects in the cache directory, with their
/// paths inside the HuggingFace repo.
const MODEL_FILES: [(&str, &str); 2] = [
    ("model.onnx", "onnx/model.onnx"),
    ("tokenizer.json", "tokenizer.json"),
];

/// Fetch any missing model files into the embedding cache directory.
/// Files already present are left untouched.
pub async fn model_download(config: &EmbeddingConfig) -> Result<()> {
    let cache_dir = expand_tilde(&config.cache_dir);
    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("failed to create cache dir: {}", cache_dir.display()))?;

    for (name, repo_path) in MODEL_FILES {
        let dest = cache_dir.join(name);
        if dest.exists() {
            println!("{name}: already present at {}", dest.display());
            continue;
        }
        println!("{name}: fetching...");
        fetch_to_file(&format!("{HF_REPO}/{repo_path}"), &dest).await?;
        println!("{name}: saved to {}", dest.display());
    }

    println!("Embedding model ready.");
    Ok(())
}

/// Stream a URL into `dest`, advancing a progress bar per chunk. The body
/// goes to a sibling `.part` file first; `dest` appears only once complete.
async fn fetch_to_file(url: &str, dest: &Path) -> Result<()> {
    let response = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("download failed for {url}"))?;

    let bar = match response.content_length() {
        Some(total) => {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::with_template("  {bytes:>10}/{total_bytes} [{wide_bar:.green}] {eta}")
                    .expect("valid template")
                    .progress_chars("=> "),
            );
            bar
        }
        None => ProgressBar::new_spinner(),
    };

    let partial = dest.with_extension("part");
    let mut file = tokio::fs::File::create(&partial)
        .await
        .with_context(|| format!("failed to create {}", partial.display()))?;

    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.context("connection lost mid-download")?;
        file.write_all(&chunk)
            .await
            .context("failed writing downloaded chunk")?;
        bar.inc(chunk.len() as u64);
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&partial, dest)
        .await
        .context("failed to move downloaded file into place")?;

    bar.finish_and_clear();
    Ok(())
}
