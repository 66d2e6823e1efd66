use std::fmt;
use std::str::FromStr;

/// Kind of asset a rendering call asks for.
///
/// The type decides which extension is inferred for bare names and which public directory is
/// used when the public fallback is enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AssetType {
    /// Script assets (`.js`).
    Javascript,
    /// Stylesheet assets (`.css`).
    Stylesheet,
    /// Images; no extension is inferred.
    Image,
    /// Any other asset requested through the generic path helper.
    #[default]
    Other,
}

impl AssetType {
    /// Extension appended to names that do not already carry it.
    pub fn default_extension(self) -> Option<&'static str> {
        match self {
            Self::Javascript => Some(".js"),
            Self::Stylesheet => Some(".css"),
            Self::Image | Self::Other => None,
        }
    }

    /// Directory under the public root that holds non-pipeline assets of this type.
    pub fn public_dir(self) -> Option<&'static str> {
        match self {
            Self::Javascript => Some("/javascripts"),
            Self::Stylesheet => Some("/stylesheets"),
            Self::Image => Some("/images"),
            Self::Other => None,
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Javascript => "javascript",
            Self::Stylesheet => "stylesheet",
            Self::Image => "image",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

impl FromStr for AssetType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "js" | "javascript" => Ok(Self::Javascript),
            "css" | "stylesheet" => Ok(Self::Stylesheet),
            "image" | "img" => Ok(Self::Image),
            "other" | "asset" => Ok(Self::Other),
            other => Err(format!("unknown asset type '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cli_spellings() {
        assert_eq!("js".parse::<AssetType>(), Ok(AssetType::Javascript));
        assert_eq!("Stylesheet".parse::<AssetType>(), Ok(AssetType::Stylesheet));
        assert_eq!("img".parse::<AssetType>(), Ok(AssetType::Image));
        assert!("font".parse::<AssetType>().is_err());
    }

    #[test]
    fn images_have_no_default_extension() {
        assert_eq!(AssetType::Image.default_extension(), None);
        assert_eq!(AssetType::Image.public_dir(), Some("/images"));
        assert_eq!(AssetType::Other.public_dir(), None);
    }
}
