//! Table footprints and chair placement.
//!
//! Closed-form per shape: a table's size follows from its seat count, and
//! chair coordinates follow from the table's size and position. Chair
//! order is part of the contract. Index `i` always lands on the same
//! geometric slot for a given configuration, which the planner's adjacency
//! rule relies on.

use std::f64::consts::PI;

use crate::types::{HeadSeating, LayoutParams, Point, Shape, Size, Table};

/// Footprint of a table seating `seat_count` chairs.
///
/// Never fails: every dimension is clamped to the shape's minimum, so a
/// zero seat count yields the minimum footprint.
pub fn table_footprint(
    seat_count: usize,
    shape: Shape,
    heads: HeadSeating,
    params: &LayoutParams,
) -> Size {
    let step = params.chair_step();
    match shape {
        Shape::Round => {
            let circumference = seat_count as f64 * step;
            let diameter = circumference / PI;
            let side = params.min_round_size.max(diameter - params.chair_size);
            Size::new(side, side)
        }
        Shape::Square => {
            let per_side = seat_count.div_ceil(4);
            let side = params.min_square_size.max(per_side as f64 * step);
            Size::new(side, side)
        }
        Shape::Rectangular => {
            let head = (heads.effective() as usize).min(seat_count);
            let long_seats = seat_count.saturating_sub(head * 2);
            let per_long = long_seats.div_ceil(2);
            Size::new(
                params.min_rect_width.max(per_long as f64 * step),
                params.min_rect_height.max(head.max(1) as f64 * step),
            )
        }
    }
}

/// Chair coordinates for `table`, one per chair in chair order.
pub fn chair_positions(table: &Table, params: &LayoutParams) -> Vec<Point> {
    layout_chairs(
        table.shape,
        table.position,
        table.size,
        table.heads,
        table.chairs.len(),
        params,
    )
}

/// Chair coordinates (top-left corners) for a table configuration.
///
/// Rectangular tables with more head chairs than seats emit surplus head
/// slots, which callers drop. The head count is capped at `count`.
pub fn layout_chairs(
    shape: Shape,
    position: Point,
    size: Size,
    heads: HeadSeating,
    count: usize,
    params: &LayoutParams,
) -> Vec<Point> {
    match shape {
        Shape::Round => round_chairs(position, size, count, params),
        Shape::Square => square_chairs(position, size, count, params),
        Shape::Rectangular => rect_chairs(position, size, heads, count, params),
    }
}

fn round_chairs(position: Point, size: Size, count: usize, params: &LayoutParams) -> Vec<Point> {
    if count == 0 {
        return Vec::new();
    }
    let step = params.chair_step();
    let half = params.chair_size / 2.0;
    let min_radius = count as f64 * step / (2.0 * PI);
    let radius = (size.width.max(size.height) / 2.0 + step).max(min_radius);
    let cx = position.x + size.width / 2.0;
    let cy = position.y + size.height / 2.0;
    (0..count)
        .map(|i| {
            let angle = 2.0 * PI / count as f64 * i as f64;
            Point::new(
                cx + radius * angle.cos() - half,
                cy + radius * angle.sin() - half,
            )
        })
        .collect()
}

// Edges in emission order for square tables.
#[derive(Clone, Copy)]
enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

fn edge_slot(edge: Edge, ratio: f64, position: Point, size: Size, params: &LayoutParams) -> Point {
    let half = params.chair_size / 2.0;
    let step = params.chair_step();
    match edge {
        Edge::Top => Point::new(position.x + ratio * size.width - half, position.y - step),
        Edge::Right => Point::new(
            position.x + size.width + params.chair_gap,
            position.y + ratio * size.height - half,
        ),
        Edge::Bottom => Point::new(
            position.x + ratio * size.width - half,
            position.y + size.height + params.chair_gap,
        ),
        Edge::Left => Point::new(position.x - step, position.y + ratio * size.height - half),
    }
}

fn push_edge(
    out: &mut Vec<Point>,
    edge: Edge,
    n: usize,
    position: Point,
    size: Size,
    params: &LayoutParams,
) {
    for i in 0..n {
        let ratio = (i + 1) as f64 / (n + 1) as f64;
        out.push(edge_slot(edge, ratio, position, size, params));
    }
}

fn square_chairs(position: Point, size: Size, count: usize, params: &LayoutParams) -> Vec<Point> {
    let base = count / 4;
    let extra = count % 4;
    let mut out = Vec::with_capacity(count);
    for (idx, edge) in [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left]
        .into_iter()
        .enumerate()
    {
        let n = base + usize::from(idx < extra);
        push_edge(&mut out, edge, n, position, size, params);
    }
    out
}

fn rect_chairs(
    position: Point,
    size: Size,
    heads: HeadSeating,
    count: usize,
    params: &LayoutParams,
) -> Vec<Point> {
    let head = (heads.effective() as usize).min(count);
    let long_seats = count.saturating_sub(head * 2);
    let top = long_seats.div_ceil(2);
    let bottom = long_seats / 2;
    let mut out = Vec::with_capacity(head * 2 + long_seats);
    push_edge(&mut out, Edge::Left, head, position, size, params);
    push_edge(&mut out, Edge::Right, head, position, size, params);
    push_edge(&mut out, Edge::Top, top, position, size, params);
    push_edge(&mut out, Edge::Bottom, bottom, position, size, params);
    out
}

/// Recompute and store chair coordinates in chair order.
///
/// Surplus coordinates are ignored; chairs without one keep `None`.
pub fn reposition_chairs(table: &mut Table, params: &LayoutParams) {
    let positions = chair_positions(table, params);
    if positions.len() != table.chairs.len() {
        tracing::warn!(
            table = %table.key,
            chairs = table.chairs.len(),
            slots = positions.len(),
            "chair geometry does not match chair count"
        );
    }
    for (i, chair) in table.chairs.iter_mut().enumerate() {
        chair.position = positions.get(i).copied();
    }
}

/// Clamp a rectangle's top-left corner so it stays inside `bounds`.
pub fn clamp_into(position: Point, size: Size, bounds: Size) -> Point {
    let max_x = (bounds.width - size.width).max(0.0);
    let max_y = (bounds.height - size.height).max(0.0);
    Point::new(position.x.clamp(0.0, max_x), position.y.clamp(0.0, max_y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chair, TableKey};

    fn params() -> LayoutParams {
        LayoutParams::default()
    }

    fn table(shape: Shape, count: usize, heads: HeadSeating) -> Table {
        let p = params();
        Table {
            key: TableKey(1),
            label: "1".into(),
            shape,
            size: table_footprint(count, shape, heads, &p),
            position: Point::new(100.0, 100.0),
            heads,
            chairs: vec![Chair::default(); count],
            party_colors: Default::default(),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn square_footprint_ten_seats() {
        let size = table_footprint(10, Shape::Square, HeadSeating::none(), &params());
        assert_eq!(size, Size::new(75.0, 75.0));
    }

    #[test]
    fn zero_seats_give_minimums() {
        let p = params();
        let none = HeadSeating::none();
        assert_eq!(table_footprint(0, Shape::Square, none, &p), Size::new(50.0, 50.0));
        assert_eq!(table_footprint(0, Shape::Round, none, &p), Size::new(50.0, 50.0));
        assert_eq!(table_footprint(0, Shape::Rectangular, none, &p), Size::new(80.0, 60.0));
    }

    #[test]
    fn round_footprint_grows_with_seats() {
        let size = table_footprint(12, Shape::Round, HeadSeating::none(), &params());
        let expected = 12.0 * 25.0 / PI - 20.0;
        assert!(close(size.width, expected));
        assert_eq!(size.width, size.height);
    }

    #[test]
    fn rect_footprint_with_heads() {
        let p = params();
        let size = table_footprint(10, Shape::Rectangular, HeadSeating::new(true, 1), &p);
        assert_eq!(size, Size::new(100.0, 60.0));
        let tall = table_footprint(10, Shape::Rectangular, HeadSeating::new(true, 3), &p);
        assert_eq!(tall, Size::new(80.0, 75.0));
    }

    #[test]
    fn rect_heads_ignored_when_disabled() {
        let p = params();
        let heads = HeadSeating {
            use_heads: false,
            per_head: 4,
        };
        let size = table_footprint(12, Shape::Rectangular, heads, &p);
        assert_eq!(size, Size::new(150.0, 60.0));
    }

    #[test]
    fn square_sides_fill_top_first() {
        let t = table(Shape::Square, 5, HeadSeating::none());
        let pos = chair_positions(&t, &params());
        assert_eq!(pos.len(), 5);
        // Two chairs on top, then one each on right, bottom, left.
        assert!(close(pos[0].y, 75.0));
        assert!(close(pos[1].y, 75.0));
        assert!(close(pos[0].x, 100.0 + 50.0 / 3.0 - 10.0));
        assert!(close(pos[2].x, 100.0 + 50.0 + 5.0));
        assert!(close(pos[3].y, 100.0 + 50.0 + 5.0));
        assert!(close(pos[4].x, 75.0));
    }

    #[test]
    fn rect_emits_heads_then_long_sides() {
        let t = table(Shape::Rectangular, 8, HeadSeating::new(true, 1));
        let pos = chair_positions(&t, &params());
        assert_eq!(pos.len(), 8);
        // Left head, right head.
        assert!(close(pos[0].x, 75.0));
        assert!(close(pos[1].x, 100.0 + t.size.width + 5.0));
        // Three on top, three on bottom.
        for p in &pos[2..5] {
            assert!(close(p.y, 75.0));
        }
        for p in &pos[5..8] {
            assert!(close(p.y, 100.0 + t.size.height + 5.0));
        }
    }

    #[test]
    fn rect_odd_long_side_favors_top() {
        let t = table(Shape::Rectangular, 5, HeadSeating::none());
        let pos = chair_positions(&t, &params());
        let top = pos.iter().filter(|p| close(p.y, 75.0)).count();
        assert_eq!(top, 3);
    }

    #[test]
    fn excess_heads_emit_surplus_slots() {
        let mut t = table(Shape::Rectangular, 4, HeadSeating::new(true, 3));
        let pos = chair_positions(&t, &params());
        assert_eq!(pos.len(), 6);
        reposition_chairs(&mut t, &params());
        assert!(t.chairs.iter().all(|c| c.position.is_some()));
    }

    #[test]
    fn absurd_head_count_stays_bounded() {
        let heads = HeadSeating::new(true, 2_000_000_000);
        let p = params();
        let size = table_footprint(2, Shape::Rectangular, heads, &p);
        assert_eq!(size, Size::new(80.0, 60.0));
        let mut t = table(Shape::Rectangular, 2, heads);
        let pos = chair_positions(&t, &p);
        assert_eq!(pos.len(), 4);
        reposition_chairs(&mut t, &p);
        assert!(t.chairs.iter().all(|c| c.position.is_some()));
    }

    #[test]
    fn round_chairs_on_circle() {
        let t = table(Shape::Round, 8, HeadSeating::none());
        let p = params();
        let pos = chair_positions(&t, &p);
        let c = t.center();
        let radius = t.size.width / 2.0 + 25.0;
        for pt in &pos {
            let dx = pt.x + 10.0 - c.x;
            let dy = pt.y + 10.0 - c.y;
            assert!(close((dx * dx + dy * dy).sqrt(), radius));
        }
        // Chair 0 sits due east of the centre.
        assert!(close(pos[0].y + 10.0, c.y));
        assert!(pos[0].x > c.x);
    }

    #[test]
    fn crowded_round_table_uses_min_radius() {
        let mut t = table(Shape::Round, 40, HeadSeating::none());
        t.size = Size::new(50.0, 50.0);
        let pos = chair_positions(&t, &params());
        let c = t.center();
        let dx = pos[0].x + 10.0 - c.x;
        assert!(close(dx, 40.0 * 25.0 / (2.0 * PI)));
    }

    #[test]
    fn positions_are_deterministic() {
        for shape in [Shape::Round, Shape::Square, Shape::Rectangular] {
            let t = table(shape, 9, HeadSeating::new(true, 2));
            assert_eq!(chair_positions(&t, &params()), chair_positions(&t, &params()));
        }
    }

    #[test]
    fn clamp_keeps_rect_inside() {
        let bounds = Size::new(500.0, 400.0);
        let size = Size::new(100.0, 50.0);
        assert_eq!(clamp_into(Point::new(-5.0, 20.0), size, bounds), Point::new(0.0, 20.0));
        assert_eq!(clamp_into(Point::new(450.0, 390.0), size, bounds), Point::new(400.0, 350.0));
    }
}
