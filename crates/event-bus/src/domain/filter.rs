//! Topic filtering beyond exact-match subscription. Segments are
//! dot-separated (`strategy.momentum.signal`); `*` matches exactly one
//! segment, `**` matches the remainder of the topic.

#[derive(Debug, Clone)]
pub struct EventFilter {
    pattern: Vec<String>,
}

impl EventFilter {
    #[must_use]
    pub fn exact(topic: impl Into<String>) -> Self {
        Self {
            pattern: topic.into().split('.').map(str::to_string).collect(),
        }
    }

    #[must_use]
    pub fn glob(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into().split('.').map(str::to_string).collect(),
        }
    }

    /// A redis-glob approximation of this filter, for server-side
    /// `PSUBSCRIBE`. `**` is widened to `*` (redis has no segment-bounded
    /// wildcard), so this pattern may over-match; callers still apply
    /// [`EventFilter::matches`] against each delivered channel name.
    #[must_use]
    pub fn redis_pattern(&self) -> String {
        self.pattern
            .iter()
            .map(|segment| if segment == "**" { "*" } else { segment.as_str() })
            .collect::<Vec<_>>()
            .join(".")
    }

    #[must_use]
    pub fn matches(&self, topic: &str) -> bool {
        let segments: Vec<&str> = topic.split('.').collect();
        Self::matches_from(&self.pattern, &segments)
    }

    fn matches_from(pattern: &[String], segments: &[&str]) -> bool {
        match pattern.split_first() {
            None => segments.is_empty(),
            Some((head, rest)) if head == "**" => {
                rest.is_empty()
                    || (0..=segments.len()).any(|i| Self::matches_from(rest, &segments[i..]))
            }
            Some((head, rest)) => match segments.split_first() {
                Some((seg, seg_rest)) if head == "*" || head == seg => {
                    Self::matches_from(rest, seg_rest)
                }
                _ => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_pattern_only_matches_itself() {
        let filter = EventFilter::exact("trade.executed");
        assert!(filter.matches("trade.executed"));
        assert!(!filter.matches("trade.rejected"));
    }

    #[test]
    fn single_wildcard_matches_one_segment() {
        let filter = EventFilter::glob("strategy.*.signal");
        assert!(filter.matches("strategy.momentum.signal"));
        assert!(!filter.matches("strategy.momentum.extra.signal"));
    }

    #[test]
    fn double_wildcard_matches_remainder() {
        let filter = EventFilter::glob("strategy.**");
        assert!(filter.matches("strategy.momentum.signal"));
        assert!(filter.matches("strategy.master.metrics"));
        assert!(!filter.matches("trade.executed"));
    }
}
