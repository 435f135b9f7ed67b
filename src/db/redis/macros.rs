/// Serves a value from the cache, computing and caching it on a miss.
///
/// A Redis failure on the read side is treated as a miss, so the cache can
/// only make a lookup faster, never make it fail. The write is queued on the
/// cache's background writer.
///
/// # Arguments
/// * `$cache`: a [`crate::db::Cache`]
/// * `$key`: the [`crate::db::CacheKey`] to read and write
/// * `$ttl`: time-to-live of the stored value, in seconds
/// * `$block`: future producing `AppResult<T>` on a miss
///
/// # Example
/// ```rust,ignore
/// let products: Vec<ProductCard> = cached!(cache, CacheKey::Trending(8), 300, async {
///     repo.trending(8).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_or_miss(&key).await {
            Some(cached) => Ok(cached),
            None => match $block.await {
                Ok(value) => {
                    $cache.set_in_background(&key, &value, $ttl);
                    Ok(value)
                }
                Err(e) => Err(e),
            },
        }
    }};
}
