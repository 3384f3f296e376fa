/// The subset of ICCCM `WM_NORMAL_HINTS` that decides a floating window's size.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SizeHints {
    pub min: Option<(i32, i32)>,
    pub max: Option<(i32, i32)>,
    pub base: Option<(i32, i32)>,
    pub increment: Option<(i32, i32)>,
    /// `((min_num, min_den), (max_num, max_den))`
    pub aspect: Option<((i32, i32), (i32, i32))>,
}

impl SizeHints {
    /// Applies min, max, increment (only together with a base size) then aspect, in that order.
    #[must_use]
    pub fn constrain(&self, mut w: i32, mut h: i32) -> (i32, i32) {
        if let Some((min_w, min_h)) = self.min {
            w = w.max(min_w);
            h = h.max(min_h);
        }
        if let Some((max_w, max_h)) = self.max {
            w = w.min(max_w);
            h = h.min(max_h);
        }
        if let (Some((inc_w, inc_h)), Some((base_w, base_h))) = (self.increment, self.base) {
            if inc_w > 0 {
                w -= base_w;
                w -= w % inc_w;
                w += base_w;
            }
            if inc_h > 0 {
                h -= base_h;
                h -= h % inc_h;
                h += base_h;
            }
        }
        if let Some(((min_x, min_y), (max_x, max_y))) = self.aspect {
            if h > 0 && min_y > 0 && max_y > 0 {
                let ratio = f64::from(w) / f64::from(h);
                let min_ratio = f64::from(min_x) / f64::from(min_y);
                let max_ratio = f64::from(max_x) / f64::from(max_y);
                if ratio < min_ratio && min_ratio > 0.0 {
                    h = (f64::from(w) / min_ratio) as i32;
                } else if ratio > max_ratio {
                    w = (f64::from(h) * max_ratio) as i32;
                }
            }
        }
        (w, h)
    }
}
