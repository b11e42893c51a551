// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writing finished images out.  Not part of the engine: this is one
//! of the things a listener might do with a framebuffer.

use std::path::Path;

use error::Error;
use framebuffer::Framebuffer;

/// Encodes the framebuffer to `path`.  The format is chosen from the
/// file extension (`.png`, `.ppm`, `.bmp`, ...).
pub fn write_image<P: AsRef<Path>>(path: P, framebuffer: &Framebuffer) -> Result<(), Error> {
    if framebuffer.is_empty() {
        return Err(Error::EmptyFramebuffer(
            framebuffer.width(),
            framebuffer.height(),
        ));
    }
    framebuffer.to_image().save(path.as_ref())?;
    debug!(
        "Wrote {}x{} image to {}",
        framebuffer.width(),
        framebuffer.height(),
        path.as_ref().display()
    );
    Ok(())
}
