use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Extension of the postcard snapshot cached next to a text corpus.
pub const SNAPSHOT_EXTENSION: &str = "bin";

/// Loads a text corpus, one phrase per line.
///
/// Both `\n` and `\r\n` endings are accepted. Blank lines are kept; the
/// model ignores them when learning.
pub fn read_corpus<P: AsRef<Path>>(corpus_path: P) -> io::Result<Vec<String>> {
	let text = fs::read_to_string(corpus_path)?;
	Ok(text.lines().map(str::to_owned).collect())
}

/// Path of the snapshot cache for a corpus: same folder, same stem,
/// `.bin` extension.
///
/// `corpora/names.dat` → `corpora/names.bin`
///
/// # Errors
/// Returns `InvalidInput` if the corpus path has no file name.
pub fn snapshot_path<P: AsRef<Path>>(corpus_path: P) -> io::Result<PathBuf> {
	let corpus_path = corpus_path.as_ref();
	let stem = corpus_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Corpus path has no file name"))?;

	let mut file_name = stem.to_os_string();
	file_name.push(".");
	file_name.push(SNAPSHOT_EXTENSION);
	Ok(corpus_path.with_file_name(file_name))
}

/// Name a corpus is served under: its file stem.
///
/// `./data/names.dat` → `names`
pub fn corpus_name<P: AsRef<Path>>(corpus_path: P) -> io::Result<String> {
	corpus_path
		.as_ref()
		.file_stem()
		.map(|stem| stem.to_string_lossy().into_owned())
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Corpus path has no file name"))
}

/// True when the path ends with `.extension`, ignoring ASCII case.
pub fn has_extension<P: AsRef<Path>>(path: P, extension: &str) -> bool {
	path.as_ref()
		.extension()
		.is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(extension))
}

/// Resolves the folder holding the corpora.
///
/// `.` and `./` become the current directory; anything else is used as given.
pub fn resolve_data_dir(input: &str) -> PathBuf {
	match input {
		"." | "./" => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
		_ => PathBuf::from(input),
	}
}

/// File names (not paths) in `dir` ending with `.extension`, sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();
	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && has_extension(&path, extension) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().into_owned());
			}
		}
	}

	files.sort();
	Ok(files)
}
