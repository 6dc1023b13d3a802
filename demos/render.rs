//! Solve a three screen placement and render it to `layout.png`.

use vscreen::geometry::{Direction, Rect, Vec2d};
use vscreen::{compute_layout, RelationMatrix};

// Palette with evenly distributed hues
fn color_palette(n: usize) -> impl Iterator<Item = tiny_skia::Color> {
    use palette::*;
    let n = u8::try_from(n).expect("too many colors");
    let red: Srgb<f32> = named::RED.into_format();
    let red = Hsl::from_color(red);
    (0..n).map(move |i| {
        let shift_frac = f32::from(i) / f32::from(n);
        let color: Hsl = red.shift_hue(360. * shift_frac);
        let color: Srgb<f32> = color.into_color();
        tiny_skia::Color::from_rgba(color.red, color.green, color.blue, 1.).unwrap()
    })
}

fn draw_layout(png_path: &std::path::Path, vscreen: Vec2d, rects: &[Rect]) {
    let mut image = tiny_skia::Pixmap::new(vscreen.x as u32, vscreen.y as u32).unwrap();
    // Solver coordinates are top-left based with y downwards, like the pixmap.
    for (rect, color) in Iterator::zip(rects.iter(), color_palette(rects.len())) {
        let rect = tiny_skia::Rect::from_xywh(
            rect.top_left.x as f32,
            rect.top_left.y as f32,
            rect.size.x as f32,
            rect.size.y as f32,
        )
        .unwrap();
        let mut paint = tiny_skia::Paint::default();
        paint.set_color(color);
        image.fill_rect(rect, &paint, tiny_skia::Transform::identity(), None);
    }
    image.save_png(png_path).unwrap()
}

fn main() {
    // A 4K desktop screen flanked by two smaller ones.
    let sizes = [
        Vec2d::new(1920, 1080),
        Vec2d::new(1280, 1024),
        Vec2d::new(3840, 2160),
    ];
    let mut relations = RelationMatrix::new(sizes.len());
    relations.set(0, 2, Some(Direction::LeftOf));
    relations.set(1, 2, Some(Direction::RightOf));
    let solution = compute_layout(
        Vec2d::new(0, 0),
        Vec2d::new(16384, 16384),
        &sizes,
        &relations,
    )
    .unwrap()
    .expect("a feasible layout");
    let rects = Vec::from_iter(
        Iterator::zip(solution.positions.iter(), sizes.iter())
            .map(|(position, size)| Rect::new(*position, *size)),
    );
    draw_layout(std::path::Path::new("layout.png"), solution.vscreen_size, &rects);
}
