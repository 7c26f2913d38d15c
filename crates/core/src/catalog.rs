//! Fixed catalogue of event topics and the event types offered under each

/// Topic whose event type is typed freely instead of picked from a list
pub const OTHER_TOPIC: &str = "Other";

/// A topic and the event types offered for it
#[derive(Debug, Clone, Copy)]
pub struct Topic {
    pub name: &'static str,
    pub options: &'static [&'static str],
}

pub const TOPICS: &[Topic] = &[
    Topic {
        name: "Concert",
        options: &["Rock show", "Jazz evening", "Classical recital", "Open mic"],
    },
    Topic {
        name: "Sport",
        options: &["Football", "Running", "Cycling", "Volleyball"],
    },
    Topic {
        name: "Food",
        options: &["Dinner", "Brunch", "Picnic", "Wine tasting"],
    },
    Topic {
        name: "Cinema",
        options: &["Premiere", "Movie night", "Festival screening"],
    },
    Topic {
        name: "Party",
        options: &["Birthday", "House party", "Board games"],
    },
    Topic {
        name: OTHER_TOPIC,
        options: &[],
    },
];

/// Look up a topic by its exact name
pub fn topic(name: &str) -> Option<&'static Topic> {
    TOPICS.iter().find(|t| t.name == name)
}

pub fn topic_names() -> impl Iterator<Item = &'static str> {
    TOPICS.iter().map(|t| t.name)
}

impl Topic {
    /// Free-text topics accept any title
    pub fn is_free_text(&self) -> bool {
        self.options.is_empty()
    }

    pub fn offers(&self, option: &str) -> bool {
        self.options.contains(&option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_lookup_is_exact() {
        assert!(topic("Concert").is_some());
        assert!(topic("concert").is_none());
        assert!(topic("Unknown").is_none());
    }

    #[test]
    fn test_options() {
        let concert = topic("Concert").unwrap();
        assert!(concert.offers("Rock show"));
        assert!(!concert.offers("Football"));
        assert!(!concert.is_free_text());
        assert!(topic(OTHER_TOPIC).unwrap().is_free_text());
    }

    #[test]
    fn test_every_listed_topic_but_other_has_options() {
        for t in TOPICS {
            assert_eq!(t.is_free_text(), t.name == OTHER_TOPIC, "{}", t.name);
        }
        assert_eq!(topic_names().count(), TOPICS.len());
    }
}
