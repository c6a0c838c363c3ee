use url::Url;

/// Resize request understood by the image host (`w_<width>,h_<height>` path segment)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageTransform {
    pub width: u32,
    pub height: u32,
}

impl ImageTransform {
    /// Preview shown on the edit form
    pub const EDIT_PREVIEW: Self = Self {
        width: 250,
        height: 160,
    };

    fn segment(&self) -> String {
        format!("w_{},h_{}", self.width, self.height)
    }

    /// URL delivering `source` with this transformation applied.
    ///
    /// The transformation goes right after the first `upload` path segment.
    /// URLs that don't parse or have no such segment come back unchanged.
    pub fn apply(&self, source: &str) -> String {
        let Ok(mut url) = Url::parse(source) else {
            return source.to_string();
        };
        let Some(segments) = url.path_segments() else {
            return source.to_string();
        };
        let mut segments: Vec<String> = segments.map(str::to_string).collect();
        let Some(upload) = segments.iter().position(|segment| segment == "upload") else {
            return source.to_string();
        };
        segments.insert(upload + 1, self.segment());

        // Segments are still percent-encoded, set_path keeps them as they are
        url.set_path(&format!("/{}", segments.join("/")));
        url.to_string()
    }
}
