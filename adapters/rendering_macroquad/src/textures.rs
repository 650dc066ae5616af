use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use gridshot_rendering::{
    RenderingError, TextureCatalog, TextureRole, TextureSize, TextureState, TextureStates,
};
use macroquad::texture::{FilterMode, Texture2D};

const SUPPORTED_MANIFEST_VERSION: u32 = 1;
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Where the backend obtains its textures.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum TextureSource {
    /// Generate the built-in brick, wood, sky and floor textures.
    #[default]
    Procedural,
    /// Load PNG files listed in a TOML manifest.
    Manifest(PathBuf),
    /// Skip textures entirely so every surface uses its flat fallback.
    Disabled,
}

/// GPU textures and their load states, keyed by role.
#[derive(Debug)]
pub struct TextureBank {
    textures: HashMap<TextureRole, Texture2D>,
    states: TextureStates,
}

impl TextureBank {
    /// Loads textures from the requested source.
    ///
    /// Must run inside the macroquad window context. Structural manifest
    /// problems are errors; a single texture that fails to load is logged
    /// and marked as failed.
    pub fn load(source: &TextureSource) -> Result<Self> {
        let bank = match source {
            TextureSource::Procedural => Self::procedural(),
            TextureSource::Manifest(path) => Self::from_manifest_path(path)?,
            TextureSource::Disabled => Self::disabled(),
        };
        bank.log_summary();
        Ok(bank)
    }

    /// Bank with every role failed.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            textures: HashMap::new(),
            states: TextureStates::failed(),
        }
    }

    /// Uploads the procedurally generated textures.
    #[must_use]
    pub fn procedural() -> Self {
        let mut loader = |role: TextureRole, _: &Path| -> Result<Texture2D> {
            let pixels = PixelBuffer::procedural(role);
            Ok(Texture2D::from_rgba8(
                pixels.width(),
                pixels.height(),
                pixels.as_rgba(),
            ))
        };
        let entries = TextureRole::ALL
            .iter()
            .map(|role| (*role, PathBuf::from("<procedural>")))
            .collect();
        Self::from_entries(entries, &mut loader)
    }

    /// Loads the textures listed in the manifest at `path`.
    pub fn from_manifest_path(path: impl AsRef<Path>) -> Result<Self> {
        let manifest_path = path.as_ref();
        let contents = fs::read_to_string(manifest_path).with_context(|| {
            format!(
                "failed to read texture manifest at {}",
                manifest_path.display()
            )
        })?;
        let base = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let entries = parse_manifest(&contents, &base)?;
        Ok(Self::from_entries(entries, &mut file_loader))
    }

    /// Texture bound to `role`, if it loaded.
    #[must_use]
    pub fn texture(&self, role: TextureRole) -> Option<Texture2D> {
        self.textures.get(&role).copied()
    }

    /// Snapshot of every role's load state.
    #[must_use]
    pub fn states(&self) -> TextureStates {
        self.states
    }

    fn from_entries(
        entries: Vec<(TextureRole, PathBuf)>,
        loader: &mut impl FnMut(TextureRole, &Path) -> Result<Texture2D>,
    ) -> Self {
        let mut bank = Self {
            textures: HashMap::with_capacity(entries.len()),
            states: TextureStates::failed(),
        };

        for (role, path) in entries {
            let texture = match loader(role, &path) {
                Ok(texture) => texture,
                Err(error) => {
                    log::warn!(
                        "texture {role:?} from {} failed to load: {error:#}",
                        path.display()
                    );
                    continue;
                }
            };

            let size = TextureSize::new(texture.width() as u32, texture.height() as u32);
            if size.width == 0 || size.height == 0 {
                log::warn!(
                    "texture {role:?} from {} decoded to an empty image",
                    path.display()
                );
                continue;
            }

            texture.set_filter(FilterMode::Nearest);
            let _ = bank.textures.insert(role, texture);
            bank.states.set(role, TextureState::Loaded(size));
        }

        bank
    }

    fn log_summary(&self) {
        let loaded: Vec<String> = self
            .states
            .iter()
            .filter_map(|(role, state)| {
                state
                    .loaded()
                    .map(|size| format!("{role:?} {}x{}", size.width, size.height))
            })
            .collect();
        let failed = TextureRole::ALL.len() - loaded.len();
        if loaded.is_empty() {
            log::info!("textures disabled; drawing flat fallbacks");
        } else {
            log::info!(
                "loaded {} textures [{}], {failed} using fallbacks",
                loaded.len(),
                loaded.join(", ")
            );
        }
    }
}

impl TextureCatalog for TextureBank {
    fn state(&self, role: TextureRole) -> TextureState {
        self.states.state(role)
    }
}

fn file_loader(_role: TextureRole, path: &Path) -> Result<Texture2D> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read texture at {}", path.display()))?;
    if !bytes.starts_with(&PNG_SIGNATURE) {
        bail!("{} is not a PNG image", path.display());
    }
    let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)
        .with_context(|| format!("failed to decode PNG at {}", path.display()))?
        .to_rgba8();
    let (Ok(width), Ok(height)) = (u16::try_from(decoded.width()), u16::try_from(decoded.height()))
    else {
        bail!(
            "{} is {}x{}, larger than a texture can hold",
            path.display(),
            decoded.width(),
            decoded.height()
        );
    };
    Ok(Texture2D::from_rgba8(width, height, decoded.as_raw()))
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    version: u32,
    textures: HashMap<String, String>,
}

/// Parses a texture manifest, resolving paths against `base_path`.
///
/// Every role must be listed exactly once; entries come back in load order.
pub fn parse_manifest(contents: &str, base_path: &Path) -> Result<Vec<(TextureRole, PathBuf)>> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse texture manifest toml contents")?;
    if manifest.version != SUPPORTED_MANIFEST_VERSION {
        bail!(
            "unsupported texture manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_MANIFEST_VERSION
        );
    }

    let mut resolved = HashMap::new();
    for (name, relative_path) in manifest.textures {
        let role = parse_texture_role(&name)?;
        let path = base_path.join(relative_path);
        if resolved.insert(role, path).is_some() {
            bail!("texture manifest contains duplicate entry for {role:?}");
        }
    }

    let mut ordered = Vec::with_capacity(TextureRole::ALL.len());
    for role in TextureRole::ALL {
        let Some(path) = resolved.remove(&role) else {
            bail!("texture manifest missing entry for {role:?}");
        };
        ordered.push((role, path));
    }

    Ok(ordered)
}

fn parse_texture_role(name: &str) -> Result<TextureRole> {
    match name {
        "Brick" => Ok(TextureRole::Brick),
        "Wood" => Ok(TextureRole::Wood),
        "Sky" => Ok(TextureRole::Sky),
        "Floor" => Ok(TextureRole::Floor),
        _ => bail!("unknown texture role `{name}` in manifest"),
    }
}

/// CPU-side RGBA8 image used to build procedural textures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u16,
    height: u16,
    rgba: Vec<u8>,
}

impl PixelBuffer {
    /// Creates an image filled with a single opaque color.
    #[must_use]
    pub fn filled(width: u16, height: u16, rgb: [u8; 3]) -> Self {
        let pixel = [rgb[0], rgb[1], rgb[2], 255];
        let count = usize::from(width) * usize::from(height);
        Self {
            width,
            height,
            rgba: pixel.repeat(count),
        }
    }

    /// Wraps an existing RGBA8 buffer.
    pub fn from_rgba(width: u16, height: u16, rgba: Vec<u8>) -> Result<Self, RenderingError> {
        let expected = usize::from(width) * usize::from(height) * 4;
        if rgba.len() != expected {
            return Err(RenderingError::TextureBuffer {
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Generates the built-in texture for `role`.
    #[must_use]
    pub fn procedural(role: TextureRole) -> Self {
        match role {
            TextureRole::Brick => procedural::brick(),
            TextureRole::Wood => procedural::wood(),
            TextureRole::Sky => procedural::sky(),
            TextureRole::Floor => procedural::floor(),
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Raw row-major RGBA8 bytes.
    #[must_use]
    pub fn as_rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Color at `(x, y)`, or `None` outside the image.
    #[must_use]
    pub fn pixel(&self, x: u16, y: u16) -> Option<[u8; 4]> {
        let index = self.index(i32::from(x), i32::from(y))?;
        let mut pixel = [0; 4];
        pixel.copy_from_slice(&self.rgba[index..index + 4]);
        Some(pixel)
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= i32::from(self.width) || y >= i32::from(self.height) {
            return None;
        }
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        Some((y * usize::from(self.width) + x) * 4)
    }

    fn blend(&mut self, x: i32, y: i32, rgb: [u8; 3], alpha: f32) {
        let Some(index) = self.index(x, y) else {
            return;
        };
        let alpha = alpha.clamp(0.0, 1.0);
        for (channel, source) in self.rgba[index..index + 3].iter_mut().zip(rgb) {
            let mixed = f32::from(*channel) * (1.0 - alpha) + f32::from(source) * alpha;
            *channel = mixed.round().clamp(0.0, 255.0) as u8;
        }
    }

    fn fill_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, rgb: [u8; 3], alpha: f32) {
        for y in y0.max(0)..y1.min(i32::from(self.height)) {
            for x in x0.max(0)..x1.min(i32::from(self.width)) {
                self.blend(x, y, rgb, alpha);
            }
        }
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, rgb: [u8; 3], alpha: f32) {
        let top = (cy - radius).floor() as i32;
        let bottom = (cy + radius).ceil() as i32;
        let left = (cx - radius).floor() as i32;
        let right = (cx + radius).ceil() as i32;
        for y in top..=bottom {
            for x in left..=right {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= radius * radius {
                    self.blend(x, y, rgb, alpha);
                }
            }
        }
    }
}

/// Built-in textures drawn in code so the game runs without asset files.
pub mod procedural {
    use super::PixelBuffer;

    const BRICK: [u8; 3] = [0x8b, 0x3a, 0x3a];
    const MORTAR: [u8; 3] = [0x6f, 0x2d, 0x2d];
    const WOOD: [u8; 3] = [0x8b, 0x5a, 0x2b];
    const GRAIN: [u8; 3] = [0x6a, 0x43, 0x23];
    const SKY_TOP: [u8; 3] = [0x88, 0x88, 0xcc];
    const SKY_BOTTOM: [u8; 3] = [0x44, 0xaa, 0x77];
    const CLOUD: [u8; 3] = [0xff, 0xff, 0xff];
    const FLOOR: [u8; 3] = [0x44, 0x44, 0x44];
    const PLANK_GAP: [u8; 3] = [0x2f, 0x2f, 0x2f];

    /// 256x256 red brick with staggered mortar joints.
    #[must_use]
    pub fn brick() -> PixelBuffer {
        let mut image = PixelBuffer::filled(256, 256, BRICK);
        let half_mortar = 3;
        for course in 0..4 {
            let course_top = course * 64;
            if course > 0 {
                image.fill_rect(
                    0,
                    course_top - half_mortar,
                    256,
                    course_top + half_mortar,
                    MORTAR,
                    1.0,
                );
            }
            let first_joint = if course % 2 == 0 { 0 } else { 48 };
            for joint in (first_joint..256).step_by(96) {
                image.fill_rect(
                    joint - half_mortar,
                    course_top,
                    joint + half_mortar,
                    course_top + 64,
                    MORTAR,
                    1.0,
                );
            }
        }
        image
    }

    /// 256x256 wood planks with three wavy grain lines.
    #[must_use]
    pub fn wood() -> PixelBuffer {
        let mut image = PixelBuffer::filled(256, 256, WOOD);
        for (baseline, amplitude) in [(40.0_f32, 10.0_f32), (120.0, 10.0), (200.0, -10.0)] {
            for x in 0..256 {
                let phase = x as f32 / 120.0 * std::f32::consts::PI;
                let y = (baseline + amplitude * phase.sin()).round() as i32;
                image.fill_rect(x, y - 1, x + 1, y + 2, GRAIN, 0.6);
            }
        }
        image
    }

    /// 512x256 vertical gradient sky with three faint clouds.
    #[must_use]
    pub fn sky() -> PixelBuffer {
        let mut image = PixelBuffer::filled(512, 256, SKY_TOP);
        for y in 0..256 {
            let t = y as f32 / 255.0;
            let mut rgb = [0; 3];
            for (channel, (top, bottom)) in rgb.iter_mut().zip(SKY_TOP.iter().zip(SKY_BOTTOM)) {
                *channel = (f32::from(*top) * (1.0 - t) + f32::from(bottom) * t).round() as u8;
            }
            image.fill_rect(0, y, 512, y + 1, rgb, 1.0);
        }
        image.fill_circle(420.0, 55.0, 12.0, CLOUD, 0.9);
        image.fill_circle(340.0, 80.0, 6.0, CLOUD, 0.45);
        image.fill_circle(460.0, 95.0, 9.0, CLOUD, 0.54);
        image
    }

    /// 128x128 dark floor with plank gaps every 16 pixels.
    #[must_use]
    pub fn floor() -> PixelBuffer {
        let mut image = PixelBuffer::filled(128, 128, FLOOR);
        for gap in (16..128).step_by(16) {
            image.fill_rect(0, gap - 1, 128, gap + 1, PLANK_GAP, 1.0);
        }
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const FULL_MANIFEST: &str = r#"
        version = 1

        [textures]
        Sky = "sky.png"
        Brick = "walls/brick.png"
        Floor = "floor.png"
        Wood = "walls/wood.png"
    "#;

    #[test]
    fn manifest_resolves_paths_in_load_order() {
        let parsed = parse_manifest(FULL_MANIFEST, Path::new("assets")).expect("manifest");

        assert_eq!(
            parsed,
            vec![
                (TextureRole::Brick, PathBuf::from("assets/walls/brick.png")),
                (TextureRole::Wood, PathBuf::from("assets/walls/wood.png")),
                (TextureRole::Sky, PathBuf::from("assets/sky.png")),
                (TextureRole::Floor, PathBuf::from("assets/floor.png")),
            ]
        );
    }

    #[test]
    fn manifest_requires_every_role() {
        let manifest = r#"
            version = 1

            [textures]
            Brick = "brick.png"
            Wood = "wood.png"
            Sky = "sky.png"
        "#;

        let error = parse_manifest(manifest, Path::new(".")).expect_err("floor missing");
        assert!(error.to_string().contains("Floor"), "{error}");
    }

    #[test]
    fn manifest_rejects_unknown_roles_and_versions() {
        let unknown = FULL_MANIFEST.replace("Sky =", "Ceiling =");
        assert!(parse_manifest(&unknown, Path::new(".")).is_err());

        let future = FULL_MANIFEST.replace("version = 1", "version = 2");
        assert!(parse_manifest(&future, Path::new(".")).is_err());
    }

    #[test]
    fn failed_textures_are_recorded_without_aborting_the_rest() {
        let entries = parse_manifest(FULL_MANIFEST, Path::new("assets")).expect("manifest");
        let attempts = RefCell::new(Vec::new());

        let bank = TextureBank::from_entries(entries, &mut |role, _| {
            attempts.borrow_mut().push(role);
            if role == TextureRole::Wood {
                bail!("corrupt file");
            }
            Ok(Texture2D::empty())
        });

        assert_eq!(attempts.borrow().as_slice(), &TextureRole::ALL);
        for role in TextureRole::ALL {
            assert_eq!(bank.state(role), TextureState::Failed);
            assert!(bank.texture(role).is_none());
        }
    }

    #[test]
    fn disabled_bank_reports_every_role_failed() {
        let bank = TextureBank::disabled();
        assert!(bank
            .states()
            .iter()
            .all(|(_, state)| state == TextureState::Failed));
    }

    #[test]
    fn non_png_files_are_rejected_before_decoding() {
        let path = std::env::temp_dir().join("gridshot-not-a-texture.txt");
        fs::write(&path, b"plain text").expect("write temp file");

        let error = file_loader(TextureRole::Brick, &path).expect_err("not a png");

        assert!(error.to_string().contains("not a PNG"), "{error}");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn truncated_png_data_is_an_error() {
        let path = std::env::temp_dir().join("gridshot-truncated.png");
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(b"truncated garbage");
        fs::write(&path, &bytes).expect("write temp file");

        let error = file_loader(TextureRole::Wood, &path).expect_err("corrupt png");

        assert!(error.to_string().contains("failed to decode"), "{error}");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn pixel_buffers_validate_their_length() {
        assert!(PixelBuffer::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert_eq!(
            PixelBuffer::from_rgba(2, 2, vec![0; 15]),
            Err(RenderingError::TextureBuffer {
                expected: 16,
                actual: 15
            })
        );
    }
}
