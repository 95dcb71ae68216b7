use super::{RepositoryError, Result as RepoResult};

pub fn find_mut<T, P>(v: &mut [T], preficate: P) -> RepoResult<&mut T>
where
    T: ::core::fmt::Debug,
    P: FnMut(&&mut T) -> bool,
{
    let mut res = v.iter_mut().filter(preficate).collect::<Vec<_>>();

    tracing::trace!("found - {:?}", res);

    match res.len() {
        0 => Err(RepositoryError::NotFound),
        1 => Ok(res.remove(0)),
        i => Err(RepositoryError::NoUnique { matched: i as u32 }),
    }
}

pub fn find_ref<T, P>(v: &[T], preficate: P) -> RepoResult<&T>
where
    T: ::core::fmt::Debug,
    P: FnMut(&&T) -> bool,
{
    let mut res = v.iter().filter(preficate).collect::<Vec<_>>();

    tracing::trace!("found - {:?}", res);

    match res.len() {
        0 => Err(RepositoryError::NotFound),
        1 => Ok(res.remove(0)),
        i => Err(RepositoryError::NoUnique { matched: i as u32 }),
    }
}

pub fn remove_one<T, P>(v: &mut Vec<T>, preficate: P) -> RepoResult<T>
where P: Fn(&T) -> bool {
    let mut res = v
        .iter()
        .enumerate()
        .filter(|(_, i)| preficate(i))
        .map(|(i, _)| i)
        .collect::<Vec<_>>();

    match res.len() {
        0 => Err(RepositoryError::NotFound),
        1 => Ok(v.remove(res.remove(0))),
        i => Err(RepositoryError::NoUnique { matched: i as u32 }),
    }
}

/// Newest-first selection, resuming strictly after `cursor` (the sort key of the cursor row).
pub fn newest_page<T, K, F, P>(
    v: &[T],
    key: F,
    cursor: Option<K>,
    preficate: P,
    limit: Option<usize>,
) -> Vec<T>
where
    T: Clone + ::core::fmt::Debug,
    K: Ord,
    F: Fn(&T) -> K,
    P: Fn(&T) -> bool,
{
    let mut res = v
        .iter()
        .filter(|i| preficate(i))
        .filter(|i| match cursor {
            Some(ref c) => key(i) < *c,
            None => true,
        })
        .cloned()
        .collect::<Vec<_>>();

    res.sort_by(|a, b| key(b).cmp(&key(a)));
    if let Some(n) = limit {
        res.truncate(n);
    }

    tracing::trace!("found - {:?}", res);

    res
}
