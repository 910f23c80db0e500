use iced::widget::canvas::{LineDash, Stroke};
use iced::{Color, Theme};
use palette::{FromColor, Hsl, Srgb};

/// Backdrop of a legend row.
pub fn legend_background(theme: &Theme) -> Color {
    theme
        .extended_palette()
        .background
        .weak
        .color
        .scale_alpha(0.4)
}

/// Backdrop of the highlighted legend row.
pub fn legend_highlight(theme: &Theme) -> Color {
    let base = theme.extended_palette().background.strong.color;
    lighten(base, 0.08).scale_alpha(0.5)
}

pub fn dashed_line(theme: &Theme) -> Stroke<'static> {
    Stroke::with_color(
        Stroke {
            width: 1.0,
            line_dash: LineDash {
                segments: &[4.0, 4.0],
                offset: 8,
            },
            ..Stroke::default()
        },
        theme
            .extended_palette()
            .secondary
            .strong
            .color
            .scale_alpha(0.6),
    )
}

/// Shift a color's lightness while keeping hue and saturation.
pub fn lighten(color: Color, amount: f32) -> Color {
    let mut hsl = Hsl::from_color(Srgb::new(color.r, color.g, color.b));
    hsl.lightness = (hsl.lightness + amount).clamp(0.0, 1.0);
    let rgb = Srgb::from_color(hsl);

    Color {
        r: rgb.red,
        g: rgb.green,
        b: rgb.blue,
        a: color.a,
    }
}
