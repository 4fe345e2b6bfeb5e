use super::types::Theme;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
struct CachedThemes {
    themes: Vec<Theme>,
    stored_at: Instant,
}

impl CachedThemes {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() >= ttl
    }
}

/// Single-slot, time-boxed cache of the theme list.
#[derive(Debug)]
pub struct ThemeCache {
    ttl: Duration,
    slot: Mutex<Option<CachedThemes>>,
}

impl ThemeCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A copy of the cached list while it is younger than the TTL.
    pub fn get(&self) -> Option<Vec<Theme>> {
        let slot = self.slot.lock().ok()?;
        slot.as_ref()
            .filter(|cached| !cached.is_expired(self.ttl))
            .map(|cached| cached.themes.clone())
    }

    pub fn store(&self, themes: &[Theme]) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(CachedThemes {
                themes: themes.to_vec(),
                stored_at: Instant::now(),
            });
        }
    }

    pub fn invalidate(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            if slot.take().is_some() {
                log::debug!("Theme cache invalidated");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn themes() -> Vec<Theme> {
        vec![Theme::bare("default", PathBuf::from("/t/default"))]
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl_and_miss_after() {
        let cache = ThemeCache::new(Duration::from_secs(30));
        cache.store(&themes());

        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(cache.get().map(|t| t.len()), Some(1));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_callers_get_independent_copies() {
        let cache = ThemeCache::new(Duration::from_secs(30));
        cache.store(&themes());

        let mut first = cache.get().unwrap();
        first[0].title = "mutated".to_string();
        first.clear();

        let second = cache.get().unwrap();
        assert_eq!(second[0].title, "default");
    }

    #[test]
    fn test_invalidate_empties_slot() {
        let cache = ThemeCache::new(Duration::from_secs(30));
        cache.store(&themes());
        cache.invalidate();
        assert!(cache.get().is_none());
    }
}
