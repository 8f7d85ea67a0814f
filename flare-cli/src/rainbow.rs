// Copyright (c) 2020-present, UMD Database Group.
//
// This program is free software: you can use, redistribute, and/or modify
// it under the terms of the GNU Affero General Public License, version 3
// or later ("AGPL"), as published by the Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
// FITNESS FOR A PARTICULAR PURPOSE.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

//! Rainbow-colored terminal output for the banner and REPL greetings.

use std::f64::consts::PI;

/// The banner printed at start-up.
pub const BANNER: &str = include_str!("./flare");

/// Prints the text with a diagonal rainbow gradient: the color shifts along
/// each line and from one line to the next.
pub fn rainbow_println(text: &str) {
    println!("{}", paint(text, 0.1, 3.0));
}

fn paint(text: &str, frequency: f64, spread: f64) -> String {
    let mut out = String::with_capacity(text.len() * 20);
    for (row, line) in text.lines().enumerate() {
        if row > 0 {
            out.push('\n');
        }
        for (col, c) in line.chars().enumerate() {
            if c.is_whitespace() {
                out.push(c);
                continue;
            }
            let (r, g, b) = rgb(frequency, (col + 2 * row) as f64 / spread);
            out.push_str(&format!("\x1b[38;2;{};{};{}m{}\x1b[0m", r, g, b, c));
        }
    }
    out
}

/// Three sine waves a third of a period apart.
fn rgb(frequency: f64, position: f64) -> (u8, u8, u8) {
    let channel = |phase: f64| ((frequency * position + phase).sin() * 127.0 + 128.0) as u8;
    (channel(0.0), channel(2.0 * PI / 3.0), channel(4.0 * PI / 3.0))
}
