//! Synthetic documents painted directly into page images.

#![allow(dead_code)]

use std::sync::Mutex;

use gridtruth::pipeline::{MarkupInjector, PageImages, Renderer};
use gridtruth::{BoundingBox, Color, Result};
use image::{Rgb, RgbImage};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// A ruled table: column and row boundaries in page pixels.
#[derive(Debug, Clone)]
pub struct SyntheticTable {
    pub page: u32,
    pub xs: Vec<u32>,
    pub ys: Vec<u32>,
    /// Index of the color its first cell gets (non-zero for a continuation)
    pub first_color: usize,
    /// Draw a second bordered rectangle inside the first cell
    pub nested: bool,
    /// Draw a black glyph with a counter in the first cell
    pub glyph: bool,
}

impl SyntheticTable {
    pub fn new(page: u32, xs: &[u32], ys: &[u32]) -> Self {
        Self {
            page,
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            first_color: 0,
            nested: false,
            glyph: false,
        }
    }

    pub fn continuing_at(mut self, first_color: usize) -> Self {
        self.first_color = first_color;
        self
    }

    pub fn nested(mut self) -> Self {
        self.nested = true;
        self
    }

    pub fn with_glyph(mut self) -> Self {
        self.glyph = true;
        self
    }

    pub fn bbox(&self) -> BoundingBox {
        let (x0, x1) = (self.xs[0], self.xs[self.xs.len() - 1]);
        let (y0, y1) = (self.ys[0], self.ys[self.ys.len() - 1]);
        BoundingBox::new(x0, y0, x1 - x0, y1 - y0)
    }

    pub fn cell_count(&self) -> usize {
        (self.xs.len() - 1) * (self.ys.len() - 1)
    }
}

#[derive(Debug, Clone)]
enum Markup {
    Plain,
    Border(Color),
    Cells(Vec<Color>),
}

/// A document whose renders are painted from a table layout.
pub struct SyntheticDocument {
    pub width: u32,
    pub height: u32,
    pub pages: u32,
    pub tables: Vec<SyntheticTable>,
    markup: Mutex<Markup>,
}

impl SyntheticDocument {
    pub fn new(width: u32, height: u32, pages: u32, tables: Vec<SyntheticTable>) -> Self {
        Self {
            width,
            height,
            pages,
            tables,
            markup: Mutex::new(Markup::Plain),
        }
    }

    /// One page with a 2x3 table at (100,100)-(800,700).
    pub fn two_by_three() -> Self {
        Self::new(
            900,
            800,
            1,
            vec![SyntheticTable::new(0, &[100, 333, 566, 800], &[100, 400, 700])],
        )
    }

    fn paint(&self, markup: &Markup) -> PageImages {
        let mut pages = PageImages::new();
        for page in 0..self.pages {
            let mut img = RgbImage::from_pixel(self.width, self.height, WHITE);
            for table in self.tables.iter().filter(|t| t.page == page) {
                paint_table(&mut img, table, markup);
            }
            pages.insert(page, img);
        }
        pages
    }
}

fn fill(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    for y in y0..y1.min(img.height()) {
        for x in x0..x1.min(img.width()) {
            img.put_pixel(x, y, color);
        }
    }
}

/// Two-pixel frame just inside (x0,y0)-(x1,y1).
fn frame(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    fill(img, x0, y0, x1, y0 + 2, color);
    fill(img, x0, y1 - 2, x1, y1, color);
    fill(img, x0, y0, x0 + 2, y1, color);
    fill(img, x1 - 2, y0, x1, y1, color);
}

fn paint_table(img: &mut RgbImage, table: &SyntheticTable, markup: &Markup) {
    let bbox = table.bbox();

    if let Markup::Cells(colors) = markup {
        let mut index = table.first_color;
        for row in table.ys.windows(2) {
            for col in table.xs.windows(2) {
                if let Some(color) = colors.get(index) {
                    fill(img, col[0], row[0], col[1], row[1], color.to_rgb());
                }
                index += 1;
            }
        }
    }

    // Interior rules, identical in every render
    for &x in &table.xs[1..table.xs.len() - 1] {
        fill(img, x - 1, bbox.y, x + 1, bbox.bottom(), BLACK);
    }
    for &y in &table.ys[1..table.ys.len() - 1] {
        fill(img, bbox.x, y - 1, bbox.right(), y + 1, BLACK);
    }

    if table.glyph {
        let (gx, gy) = (table.xs[0] + 40, table.ys[0] + 40);
        fill(img, gx, gy, gx + 30, gy + 30, BLACK);
        let counter = match markup {
            Markup::Cells(colors) => colors
                .get(table.first_color)
                .map(|c| c.to_rgb())
                .unwrap_or(WHITE),
            _ => WHITE,
        };
        fill(img, gx + 10, gy + 10, gx + 20, gy + 20, counter);
    }

    let border = match markup {
        Markup::Plain => BLACK,
        Markup::Border(color) => color.to_rgb(),
        Markup::Cells(_) => Color::AQUA.to_rgb(),
    };
    frame(img, bbox.x, bbox.y, bbox.right(), bbox.bottom(), border);
    if table.nested {
        let (nx, ny) = (table.xs[0] + 20, table.ys[0] + 20);
        frame(img, nx, ny, nx + 120, ny + 80, border);
    }
}

impl MarkupInjector for SyntheticDocument {
    fn draw_border(&self, color: Color) -> Result<()> {
        *self.markup.lock().unwrap() = Markup::Border(color);
        Ok(())
    }

    fn assign_cell_colors(&self, colors: &[Color]) -> Result<usize> {
        *self.markup.lock().unwrap() = Markup::Cells(colors.to_vec());
        let max = self
            .tables
            .iter()
            .filter(|t| !t.nested)
            .map(|t| t.first_color + t.cell_count())
            .max()
            .unwrap_or(0);
        Ok(max)
    }
}

impl Renderer for SyntheticDocument {
    fn render(&self) -> Result<PageImages> {
        let markup = self.markup.lock().unwrap().clone();
        Ok(self.paint(&markup))
    }
}

/// Approximate box equality, tolerating the localizer's border ring.
pub fn near(found: &BoundingBox, expected: &BoundingBox, slack: u32) -> bool {
    found.x.abs_diff(expected.x) <= slack
        && found.y.abs_diff(expected.y) <= slack
        && found.right().abs_diff(expected.right()) <= slack
        && found.bottom().abs_diff(expected.bottom()) <= slack
}
