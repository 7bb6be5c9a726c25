//! Media query gate
//!
//! An include with a `media` attribute only fetches when the environment
//! matches the query.

/// Decides whether a media query matches the current environment
pub trait MediaMatcher {
    fn matches(&self, query: &str) -> bool;
}

/// Matcher that accepts every query
#[derive(Debug, Clone, Copy, Default)]
pub struct AllMedia;

impl MediaMatcher for AllMedia {
    fn matches(&self, _query: &str) -> bool {
        true
    }
}

/// Output medium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaType {
    #[default]
    Screen,
    Print,
}

/// Fixed viewport evaluated against width/height/orientation features
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub media_type: MediaType,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            media_type: MediaType::Screen,
        }
    }

    /// Evaluate one query of a comma-separated list
    fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_ascii_lowercase();
        let (negated, rest) = if let Some(rest) = query.strip_prefix("not ") {
            (true, rest)
        } else if let Some(rest) = query.strip_prefix("only ") {
            (false, rest)
        } else {
            (false, query.as_str())
        };

        let matched = rest
            .split(" and ")
            .map(str::trim)
            .all(|part| {
                if part.starts_with('(') {
                    self.matches_feature(part)
                } else {
                    self.matches_type(part)
                }
            });

        matched != negated
    }

    fn matches_type(&self, media_type: &str) -> bool {
        match media_type {
            "all" => true,
            "screen" => self.media_type == MediaType::Screen,
            "print" => self.media_type == MediaType::Print,
            _ => false,
        }
    }

    fn matches_feature(&self, feature: &str) -> bool {
        let Some(inner) = feature.strip_prefix('(').and_then(|f| f.strip_suffix(')')) else {
            return false;
        };
        let Some((name, value)) = inner.split_once(':') else {
            return false;
        };
        let value = value.trim();

        match name.trim() {
            "orientation" => match value {
                "portrait" => self.height >= self.width,
                "landscape" => self.width > self.height,
                _ => false,
            },
            "width" => parse_length(value).is_some_and(|v| self.width as f32 == v),
            "min-width" => parse_length(value).is_some_and(|v| self.width as f32 >= v),
            "max-width" => parse_length(value).is_some_and(|v| self.width as f32 <= v),
            "height" => parse_length(value).is_some_and(|v| self.height as f32 == v),
            "min-height" => parse_length(value).is_some_and(|v| self.height as f32 >= v),
            "max-height" => parse_length(value).is_some_and(|v| self.height as f32 <= v),
            _ => false,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1024, 768)
    }
}

impl MediaMatcher for Viewport {
    fn matches(&self, query: &str) -> bool {
        if query.trim().is_empty() {
            return true;
        }
        query.split(',').any(|q| self.matches_query(q))
    }
}

/// Length in CSS pixels (`px`, `em`/`rem` at 16px, or unitless zero)
fn parse_length(value: &str) -> Option<f32> {
    if let Some(px) = value.strip_suffix("px") {
        return px.trim().parse().ok();
    }
    if let Some(em) = value.strip_suffix("rem").or_else(|| value.strip_suffix("em")) {
        return em.trim().parse::<f32>().ok().map(|v| v * 16.0);
    }
    match value.parse::<f32>() {
        Ok(v) if v == 0.0 => Some(0.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_features() {
        let vp = Viewport::new(800, 600);
        assert!(vp.matches("(min-width: 600px)"));
        assert!(!vp.matches("(min-width: 1000px)"));
        assert!(vp.matches("(max-width: 50em)"));
        assert!(vp.matches("screen and (min-width: 600px) and (max-height: 700px)"));
    }

    #[test]
    fn test_types_and_negation() {
        let vp = Viewport::default();
        assert!(vp.matches("all"));
        assert!(vp.matches("only screen"));
        assert!(!vp.matches("print"));
        assert!(vp.matches("not print"));
        assert!(vp.matches("print, (orientation: landscape)"));
    }

    #[test]
    fn test_unknown_and_empty() {
        let vp = Viewport::default();
        assert!(vp.matches(""));
        assert!(!vp.matches("(hover: hover)"));
        assert!(!vp.matches("(min-width)"));
        assert!(AllMedia.matches("print"));
    }
}
