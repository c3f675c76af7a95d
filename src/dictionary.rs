use std::{fs, io, path::Path};

use sequence_transform_core::{BuildError, FunctionCode, Rule, Trie, TrieBuilder};

/// Reads a compiled dictionary container from disk.
pub fn load_dictionary(path: &Path) -> io::Result<Trie> {
    let bytes = fs::read(path)?;
    let trie = Trie::from_container(&bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    tracing::info!(
        path = %path.display(),
        data_len = trie.data().len(),
        completions_len = trie.completions().len(),
        "dictionary loaded"
    );
    Ok(trie)
}

pub fn store_dictionary(path: &Path, trie: &Trie) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, trie.to_container())
}

/// Small English dictionary used when no file is configured.
pub fn builtin_dictionary() -> Result<Trie, BuildError> {
    let mut builder = TrieBuilder::new();
    builder
        .add("qk", "quick", 1)?
        .add("wd", "would", 1)?
        .add("ppl", "people", 2)?
        .add("th👆", "the", 2)?
        .add("b👆", "because", 1)?
        .add("i👆", "ing", 1)?
        .add("dv", "develop", 1)?;

    // "development" reuses the "develop" a preceding "dv" left on screen.
    builder.add_rule(Rule::with_backrefs("dvt", 7, "ment", 7)?)?;

    builder
        .add_rule(Rule::new(".👆", " ", 0)?.with_function(FunctionCode::OneShotShift))?
        .add_rule(Rule::new("🔁", "", 0)?.with_function(FunctionCode::RepeatLastKey))?
        .add_rule(Rule::new("g👉", "going ", 1)?.with_function(FunctionCode::SuppressBoundary))?;

    builder.build()
}
