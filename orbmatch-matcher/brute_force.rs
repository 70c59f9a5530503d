use orbmatch_core::DescriptorDistance;

/// Index and distance of the closest candidate; ties resolve to the lowest index
pub fn nearest<D: DescriptorDistance>(query: &D, candidates: &[D]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, candidate) in candidates.iter().enumerate() {
        let distance = query.distance(candidate);
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((idx, distance)),
        }
    }
    best
}

/// Closest candidate plus the distance of the runner-up (if there is one)
pub fn two_nearest<D: DescriptorDistance>(query: &D, candidates: &[D]) -> Option<((usize, f32), Option<f32>)> {
    let mut best: Option<(usize, f32)> = None;
    let mut second: Option<f32> = None;

    for (idx, candidate) in candidates.iter().enumerate() {
        let distance = query.distance(candidate);
        match best {
            Some((_, d)) if distance >= d => {
                if second.is_none_or(|s| distance < s) {
                    second = Some(distance);
                }
            }
            Some((_, d)) => {
                second = Some(d);
                best = Some((idx, distance));
            }
            None => best = Some((idx, distance)),
        }
    }

    best.map(|b| (b, second))
}
