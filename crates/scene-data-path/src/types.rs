//! Type definitions for dotted paths.

/// A single step of a path: an object key or a decimal array index.
pub type PathStep = String;

/// A path split into steps.
pub type Path = Vec<PathStep>;

/// Anything that can be turned into path steps.
///
/// Strings are split on `.`; the empty string is the root path. Step
/// sequences are copied so the caller keeps ownership of its own vector.
pub trait AsPath {
    fn as_path(&self) -> Path;
}

impl AsPath for str {
    fn as_path(&self) -> Path {
        if self.is_empty() {
            return Vec::new();
        }
        self.split('.').map(str::to_owned).collect()
    }
}

impl AsPath for String {
    fn as_path(&self) -> Path {
        self.as_str().as_path()
    }
}

impl AsPath for [String] {
    fn as_path(&self) -> Path {
        self.to_vec()
    }
}

impl AsPath for Vec<String> {
    fn as_path(&self) -> Path {
        self.clone()
    }
}

impl AsPath for [&str] {
    fn as_path(&self) -> Path {
        self.iter().map(|s| (*s).to_owned()).collect()
    }
}

impl AsPath for Vec<&str> {
    fn as_path(&self) -> Path {
        self.as_slice().as_path()
    }
}

impl<const N: usize> AsPath for [&str; N] {
    fn as_path(&self) -> Path {
        self.as_slice().as_path()
    }
}

impl<const N: usize> AsPath for [String; N] {
    fn as_path(&self) -> Path {
        self.to_vec()
    }
}

impl<T: AsPath + ?Sized> AsPath for &T {
    fn as_path(&self) -> Path {
        (**self).as_path()
    }
}

/// Converts a dotted string or a step sequence into an owned path.
///
/// # Example
///
/// ```
/// use scene_data_path::as_path;
///
/// assert_eq!(as_path("a.b.0"), vec!["a", "b", "0"]);
/// assert_eq!(as_path(["a", "b"]), vec!["a", "b"]);
/// assert!(as_path("").is_empty());
/// ```
pub fn as_path(path: impl AsPath) -> Path {
    path.as_path()
}
