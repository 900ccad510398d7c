use crate::Coord;

/// Integer Bresenham line from `from` toward `to`. The start point is included and the end point
/// is not, so the line has `max(|dx|, |dy|)` points and `line(p, p)` is empty.
pub fn line(from: Coord, to: Coord) -> Vec<Coord> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;

    // Walk along the longer axis and accumulate error on the shorter one.
    let steep = dx.abs() < dy.abs();
    let (longest, shortest, step, gradient_step) = if steep {
        (dy.abs(), dx.abs(), dy.signum(), dx.signum())
    } else {
        (dx.abs(), dy.abs(), dx.signum(), dy.signum())
    };

    let mut points = Vec::with_capacity(longest as usize);
    let (mut x, mut y) = (from.x, from.y);
    let mut accumulation = longest / 2;
    for _ in 0..longest {
        points.push(Coord::new(x, y));
        if steep {
            y += step;
        } else {
            x += step;
        }

        accumulation += shortest;
        if accumulation >= longest {
            if steep {
                x += gradient_step;
            } else {
                y += gradient_step;
            }
            accumulation -= longest;
        }
    }

    points
}

/// Every cell within Euclidean distance `radius` of `center`, unbounded.
pub fn disc(center: Coord, radius: i32) -> impl Iterator<Item = Coord> {
    let r2 = radius * radius;

    (-radius..=radius).flat_map(move |dx| {
        (-radius..=radius)
            .filter(move |dy| dx * dx + dy * dy <= r2)
            .map(move |dy| center.offset(dx, dy))
    })
}
