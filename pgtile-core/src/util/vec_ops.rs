/// Moves `item` to the most recent end of a recency stack.
#[inline]
pub fn push_recent<T: PartialEq>(target: &mut Vec<T>, item: T) {
    discard(target, &item);
    target.push(item);
}

#[inline]
pub fn discard<T: PartialEq>(target: &mut Vec<T>, item: &T) -> bool {
    let before = target.len();
    target.retain(|t| t != item);
    before != target.len()
}

/// Most recent first.
#[inline]
pub fn nth_recent<T: Copy>(target: &[T], n: usize) -> Option<T> {
    target.iter().rev().nth(n).copied()
}
