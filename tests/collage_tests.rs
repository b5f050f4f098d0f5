use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::collections::HashSet;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use friendship_wrapped::collage::{
    CollageRequest, Compositor, FetchError, ImageFetcher, MemoryRef, Typeface, CANVAS_HEIGHT,
    CANVAS_WIDTH, MAX_MEMORIES,
};

fn png_bytes(width: u32, height: u32, color: Rgba<u8>) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, color))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Serves a small green photo for every source and records what was asked for
#[derive(Default)]
struct RecordingFetcher {
    requested: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageFetcher for RecordingFetcher {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, FetchError> {
        self.requested.lock().unwrap().push(source.to_string());
        Ok(png_bytes(64, 48, Rgba([20, 220, 40, 255])))
    }
}

/// Errors on `bad*` sources, never answers `slow*` sources
struct FlakyFetcher;

#[async_trait]
impl ImageFetcher for FlakyFetcher {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, FetchError> {
        if source.starts_with("bad") {
            return Err(FetchError::UnsupportedSource(source.to_string()));
        }
        if source.starts_with("slow") {
            tokio::time::sleep(Duration::from_secs(120)).await;
        }
        Ok(png_bytes(64, 48, Rgba([20, 220, 40, 255])))
    }
}

fn memories(count: usize) -> Vec<MemoryRef> {
    (0..count)
        .map(|i| MemoryRef::new(format!("https://blob.example.com/{}.jpg", i)))
        .collect()
}

fn compositor(fetcher: Arc<dyn ImageFetcher>) -> Compositor {
    Compositor::new(fetcher, Typeface::bundled().unwrap(), 2025)
}

fn decode(png: &[u8]) -> RgbaImage {
    image::load_from_memory(png).unwrap().to_rgba8()
}

fn count_pixels(
    img: &RgbaImage,
    xs: std::ops::Range<u32>,
    ys: std::ops::Range<u32>,
    matches: impl Fn([u8; 4]) -> bool,
) -> usize {
    ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
        .filter(|&(x, y)| matches(img.get_pixel(x, y).0))
        .count()
}

/// Rows in which the two renders differ
fn differing_rows(a: &RgbaImage, b: &RgbaImage) -> Vec<u32> {
    (0..a.height())
        .filter(|&y| (0..a.width()).any(|x| a.get_pixel(x, y) != b.get_pixel(x, y)))
        .collect()
}

#[tokio::test]
async fn test_grid_structure_and_canvas_size() {
    let compositor = compositor(Arc::new(RecordingFetcher::default()));

    for (count, columns, rows) in [(1, 1, 1), (2, 2, 1), (4, 2, 2), (6, 3, 2), (9, 3, 3), (14, 3, 5), (24, 3, 8)] {
        let result = compositor
            .compose(&memories(count), "Sam", "https://example.com/w/sam-2025")
            .await
            .unwrap();

        let grid = result.grid.unwrap();
        assert_eq!((grid.columns, grid.rows), (columns, rows), "count {}", count);
        assert_eq!(result.photo_count, count);
        assert_eq!(result.placeholder_count, 0);
        assert_eq!(decode(&result.png).dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
    }
}

#[tokio::test]
async fn test_empty_collage_is_text_only() {
    let fetcher = Arc::new(RecordingFetcher::default());
    let compositor = compositor(fetcher.clone());

    let result = compositor
        .compose(&[], "Sam", "https://example.com/w/sam-2025")
        .await
        .unwrap();

    assert!(result.grid.is_none());
    assert_eq!(result.photo_count, 0);
    assert!(fetcher.requested.lock().unwrap().is_empty());

    let img = decode(&result.png);
    assert_eq!(img.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
    // Solid base, no gradient wash
    assert_eq!(img.get_pixel(5, 5), img.get_pixel(5, 1900));
    // Title is still drawn over the base
    assert!(count_pixels(&img, 0..CANVAS_WIDTH, 940..1060, |p| p[0] > 240) > 500);
}

#[tokio::test]
async fn test_large_input_is_sampled_without_replacement() {
    let fetcher = Arc::new(RecordingFetcher::default());
    let compositor = compositor(fetcher.clone());
    let input = memories(40);

    let result = compositor
        .compose(&input, "Sam", "https://example.com/w/sam-2025")
        .await
        .unwrap();

    assert_eq!(result.photo_count, MAX_MEMORIES);
    let grid = result.grid.unwrap();
    assert_eq!((grid.columns, grid.rows), (3, 8));

    let requested = fetcher.requested.lock().unwrap().clone();
    assert_eq!(requested.len(), MAX_MEMORIES);

    let unique: HashSet<_> = requested.iter().collect();
    assert_eq!(unique.len(), MAX_MEMORIES);

    let known: HashSet<_> = input.iter().map(|m| &m.photo_url).collect();
    assert!(requested.iter().all(|s| known.contains(s)));
}

#[tokio::test]
async fn test_failed_images_become_placeholders() {
    let compositor =
        compositor(Arc::new(FlakyFetcher)).with_fetch_timeout(Duration::from_millis(200));
    let input = vec![
        MemoryRef::new("good-1.jpg"),
        MemoryRef::new("bad-host.jpg"),
        MemoryRef::new("slow-host.jpg"),
        MemoryRef::new("good-2.jpg"),
    ];

    let started = Instant::now();
    let result = compositor
        .compose(&input, "Sam", "https://example.com/w/sam-2025")
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(30));
    assert_eq!(result.photo_count, 4);
    assert_eq!(result.placeholder_count, 2);

    // Top-right cell holds the gray placeholder, top-left the green photo
    let img = decode(&result.png);
    let photo = img.get_pixel(270, 300).0;
    let placeholder = img.get_pixel(810, 300).0;
    assert!(photo[1] > 150 && photo[0] < 60);
    assert!(placeholder[0] > 25 && placeholder[0] < 70);
    assert!((placeholder[1] as i32 - placeholder[0] as i32).abs() < 20);

    // "Photo" label in light gray across the middle of the placeholder cell
    let label = count_pixels(&img, 640..980, 430..530, |p| {
        p[0] > 110 && p[0] < 170 && p[2] > p[0]
    });
    assert!(label > 200, "label pixels: {}", label);
    assert_eq!(count_pixels(&img, 100..440, 430..530, |p| p[0] > 110), 0);
}

#[tokio::test]
async fn test_three_memories_leave_one_empty_cell() {
    let compositor = compositor(Arc::new(RecordingFetcher::default()));
    let request = CollageRequest {
        memories: vec![
            MemoryRef::new("a.jpg"),
            MemoryRef::new("b.jpg"),
            MemoryRef::new("c.jpg"),
        ],
        host_label: "Sam".to_string(),
        share_url: "https://example.com/w/sam-2025".to_string(),
        year: None,
    };

    let result = compositor.compose_request(&request).await.unwrap();
    let grid = result.grid.unwrap();
    assert_eq!((grid.columns, grid.rows), (2, 2));
    assert_eq!(result.photo_count, 3);

    let img = decode(&result.png);
    // Cell 0 shows the photo, cell 3 is the bare (darkened) base
    assert!(img.get_pixel(200, 300).0[1] > 150);
    let empty = img.get_pixel(800, 1500).0;
    assert!(empty[0] < 10 && empty[1] < 10 && empty[2] < 10);
}

#[tokio::test]
async fn test_composition_is_structurally_deterministic() {
    let compositor = compositor(Arc::new(RecordingFetcher::default()));
    let input = memories(7);

    let first = compositor.compose(&input, "", "https://example.com/w/x").await.unwrap();
    let second = compositor.compose(&input, "", "https://example.com/w/x").await.unwrap();

    assert_eq!(first.grid, second.grid);
    assert_eq!(first.photo_count, second.photo_count);
    assert_eq!(first.png, second.png);
}

#[tokio::test]
async fn test_host_label_only_changes_its_own_band() {
    let compositor = compositor(Arc::new(RecordingFetcher::default()));
    let input = memories(1);
    let url = "https://example.com/w/sam-2025";

    let with_host = decode(&compositor.compose(&input, "Sam", url).await.unwrap().png);
    let without_host = decode(&compositor.compose(&input, "", url).await.unwrap().png);

    let rows = differing_rows(&with_host, &without_host);
    assert!(!rows.is_empty());
    // Host line (and its shadow) sits above the title, which keeps its anchor
    assert!(rows.iter().all(|&y| (815..950).contains(&y)), "rows {:?}", rows);
    assert!(count_pixels(&with_host, 300..780, 850..910, |p| p[0] > 240) > 100);
}

#[tokio::test]
async fn test_share_url_chip_is_drawn_bottom_right() {
    let compositor = compositor(Arc::new(RecordingFetcher::default()));
    let input = memories(1);

    let with_url = decode(
        &compositor
            .compose(&input, "Sam", "https://example.com/w/sam-2025")
            .await
            .unwrap()
            .png,
    );
    let without_url = decode(&compositor.compose(&input, "Sam", "").await.unwrap().png);

    // Chip padding right of the text is darker than the bare photo
    let chip = with_url.get_pixel(1048, 1870).0;
    let bare = without_url.get_pixel(1048, 1870).0;
    assert!(chip[1] < bare[1] - 40, "chip {:?} vs bare {:?}", chip, bare);

    // White URL glyphs inside the chip
    assert!(count_pixels(&with_url, 600..1040, 1850..1890, |p| p[0] > 200) > 50);

    // Nothing outside the chip changes
    let rows = differing_rows(&with_url, &without_url);
    assert!(rows.iter().all(|&y| (1845..1895).contains(&y)), "rows {:?}", rows);
    assert_eq!(with_url.get_pixel(100, 1870), without_url.get_pixel(100, 1870));
}

#[test]
fn test_request_deserializes_from_camel_case() {
    let request: CollageRequest = serde_json::from_str(
        r#"{"memories":[{"photoUrl":"https://blob.example.com/a.jpg"}],"hostLabel":"Sam","shareUrl":"https://example.com/w/sam-2025"}"#,
    )
    .unwrap();

    assert_eq!(request.memories[0].photo_url, "https://blob.example.com/a.jpg");
    assert_eq!(request.host_label, "Sam");
    assert_eq!(request.year, None);
}
