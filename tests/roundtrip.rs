use animgif::block::DisposalMethod;
use animgif::{Encoder, Error};
use gif::{ColorOutput, DecodeOptions, Repeat};
use pix::rgb::SRgb8;

/// Decoded frame
struct Decoded {
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    delay: u16,
    transparent: Option<u8>,
    buffer: Vec<u8>,
}

/// Decoded animation
struct Animation {
    width: u16,
    height: u16,
    palette: Vec<u8>,
    repeat: Repeat,
    frames: Vec<Decoded>,
}

fn decode(data: &[u8]) -> Animation {
    let mut opts = DecodeOptions::new();
    opts.set_color_output(ColorOutput::Indexed);
    let mut dec = opts.read_info(data).unwrap();
    let width = dec.width();
    let height = dec.height();
    let palette = dec.global_palette().unwrap_or_default().to_vec();
    let mut frames = vec![];
    while let Some(f) = dec.read_next_frame().unwrap() {
        frames.push(Decoded {
            left: f.left,
            top: f.top,
            width: f.width,
            height: f.height,
            delay: f.delay,
            transparent: f.transparent,
            buffer: f.buffer.to_vec(),
        });
    }
    let repeat = dec.repeat();
    Animation {
        width,
        height,
        palette,
        repeat,
        frames,
    }
}

/// Compose decoded frames onto a canvas, keeping each result
fn compose(anim: &Animation) -> Vec<Vec<u8>> {
    let stride = usize::from(anim.width);
    let mut canvas = vec![0; stride * usize::from(anim.height)];
    let mut result = vec![];
    for f in &anim.frames {
        for y in 0..usize::from(f.height) {
            for x in 0..usize::from(f.width) {
                let p = f.buffer[y * usize::from(f.width) + x];
                if Some(p) != f.transparent {
                    let cy = usize::from(f.top) + y;
                    let cx = usize::from(f.left) + x;
                    canvas[cy * stride + cx] = p;
                }
            }
        }
        result.push(canvas.clone());
    }
    result
}

fn gray(depth: u8) -> Vec<SRgb8> {
    let n = 1usize << depth;
    (0..n)
        .map(|i| {
            let v = (i * 255 / (n - 1)) as u8;
            SRgb8::new(v, v, v)
        })
        .collect()
}

/// Pseudo-random indices
fn noise(len: usize, seed: u32, depth: u8) -> Vec<u8> {
    let mask = ((1u32 << depth) - 1) as u8;
    let mut seed = seed;
    (0..len)
        .map(|_| {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            (seed >> 16) as u8 & mask
        })
        .collect()
}

/// Frame with a filled rectangle
fn square(
    w: usize,
    h: usize,
    x0: usize,
    y0: usize,
    sz: usize,
    c: u8,
) -> Vec<u8> {
    let mut v = vec![0; w * h];
    for y in y0..(y0 + sz).min(h) {
        for x in x0..(x0 + sz).min(w) {
            v[y * w + x] = c;
        }
    }
    v
}

fn encode_frames(
    width: u32,
    height: u32,
    depth: u8,
    frames: &[Vec<u8>],
) -> Vec<u8> {
    let mut session = Encoder::new(vec![], width, height)
        .with_palette(&gray(depth), depth)
        .with_loop_count(Some(0))
        .into_session()
        .unwrap();
    for f in frames {
        session.frame_buf().copy_from_slice(f);
        session.add_frame(4).unwrap();
    }
    session.close().unwrap()
}

#[test]
fn every_depth() {
    for depth in 1..=8 {
        for &(w, h) in &[(1, 1), (3, 5), (17, 9), (64, 2)] {
            let frame = noise(w * h, u32::from(depth) * 7, depth);
            let frames = [frame.clone()];
            let gif = encode_frames(w as u32, h as u32, depth, &frames);
            assert_eq!(&gif[..6], b"GIF89a");
            assert_eq!(gif.last(), Some(&0x3B));
            let anim = decode(&gif);
            assert_eq!(usize::from(anim.width), w);
            assert_eq!(usize::from(anim.height), h);
            assert_eq!(anim.palette.len(), 3 << depth);
            assert_eq!(anim.frames.len(), 1);
            assert_eq!(anim.frames[0].buffer, frame);
        }
    }
}

#[test]
fn two_by_two_scenario() {
    let palette = [SRgb8::new(0, 0, 0), SRgb8::new(255, 255, 255)];
    let mut session = Encoder::new(vec![], 2, 2)
        .with_palette(&palette, 1)
        .into_session()
        .unwrap();
    session.frame_buf().copy_from_slice(&[0, 0, 0, 0]);
    session.add_frame(10).unwrap();
    session.frame_buf().copy_from_slice(&[0, 0, 1, 1]);
    session.add_frame(10).unwrap();
    let gif = session.close().unwrap();
    assert_eq!(&gif[..6], b"GIF87a");
    let anim = decode(&gif);
    assert_eq!(anim.palette, [0, 0, 0, 255, 255, 255]);
    let f = &anim.frames;
    assert_eq!((f[0].left, f[0].top, f[0].width, f[0].height), (0, 0, 2, 2));
    assert_eq!((f[1].left, f[1].top, f[1].width, f[1].height), (0, 1, 2, 1));
    assert_eq!(f[1].buffer, [1, 1]);
    assert_eq!(f[1].delay, 10);
}

#[test]
fn unchanged_frame() {
    let frame = noise(40 * 30, 99, 4);
    let gif = encode_frames(40, 30, 4, &[frame.clone(), frame.clone()]);
    let anim = decode(&gif);
    let f = &anim.frames[1];
    assert_eq!((f.left, f.top, f.width, f.height), (0, 0, 1, 1));
    assert_eq!(f.buffer, [frame[0]]);
    let composed = compose(&anim);
    assert_eq!(composed[1], frame);
}

#[test]
fn first_frame_full_canvas() {
    // all zeros, same as the initial reference buffer
    let frame = vec![0; 12 * 7];
    let gif = encode_frames(12, 7, 2, &[frame]);
    let anim = decode(&gif);
    let f = &anim.frames[0];
    assert_eq!((f.left, f.top, f.width, f.height), (0, 0, 12, 7));
}

#[test]
fn moving_square() {
    let (w, h) = (48, 32);
    let frames: Vec<Vec<u8>> = (0..12)
        .map(|i| square(w, h, i * 3, i * 2, 8, (i % 15) as u8 + 1))
        .collect();
    let gif = encode_frames(w as u32, h as u32, 4, &frames);
    let anim = decode(&gif);
    assert_eq!(anim.repeat, Repeat::Infinite);
    assert_eq!(anim.frames.len(), frames.len());
    for f in &anim.frames[1..] {
        assert!(usize::from(f.width) < w);
        assert!(usize::from(f.height) < h);
        assert_eq!(f.delay, 4);
    }
    assert_eq!(compose(&anim), frames);
}

#[test]
fn noisy_frames() {
    // large enough to fill the LZW dictionary many times
    let (w, h) = (256, 200);
    let mut frames = vec![noise(w * h, 1, 8)];
    let mut second = frames[0].clone();
    for p in &mut second[w * 50..w * 150] {
        *p = p.wrapping_add(1);
    }
    frames.push(second);
    let gif = encode_frames(w as u32, h as u32, 8, &frames);
    let anim = decode(&gif);
    let f = &anim.frames[1];
    assert_eq!((f.left, f.top, f.width, f.height), (0, 50, 256, 100));
    assert_eq!(compose(&anim), frames);
}

#[test]
fn loop_count() {
    let mut session = Encoder::new(vec![], 4, 4)
        .with_loop_count(Some(3))
        .into_session()
        .unwrap();
    session.add_frame(0).unwrap();
    let gif = session.close().unwrap();
    assert_eq!(&gif[..6], b"GIF89a");
    assert_eq!(decode(&gif).repeat, Repeat::Finite(3));

    let mut session = Encoder::new(vec![], 4, 4).into_session().unwrap();
    session.add_frame(0).unwrap();
    let gif = session.close().unwrap();
    assert_eq!(&gif[..6], b"GIF87a");
    assert!(!gif.windows(11).any(|w| w == b"NETSCAPE2.0"));
}

#[test]
fn transparent_color() {
    let mut session = Encoder::new(vec![], 3, 3)
        .with_palette(&gray(2), 2)
        .with_transparent_color(Some(3))
        .into_session()
        .unwrap();
    session.frame_buf().fill(1);
    session.add_frame(0).unwrap();
    session.frame_buf().set_pixel(1, 1, 2);
    session.add_frame(0).unwrap();
    let gif = session.close().unwrap();
    assert_eq!(&gif[..6], b"GIF89a");
    let anim = decode(&gif);
    for f in &anim.frames {
        assert_eq!(f.transparent, Some(3));
    }
    assert_eq!(anim.frames[1].buffer, [2]);
}

#[test]
fn background_disposal() {
    let (w, h) = (16, 16);
    let mut session = Encoder::new(vec![], w, h)
        .with_palette(&gray(2), 2)
        .with_disposal_method(DisposalMethod::Background)
        .into_session()
        .unwrap();
    session.add_frame(0).unwrap();
    session.frame_buf().set_pixel(3, 3, 1);
    session.add_frame(0).unwrap();
    let gif = session.close().unwrap();
    let anim = decode(&gif);
    for f in &anim.frames {
        assert_eq!((f.left, f.top, f.width, f.height), (0, 0, 16, 16));
    }
}

#[test]
fn create_file() {
    let path = std::env::temp_dir().join("animgif_create_file.gif");
    let mut session = Encoder::create(&path, 8, 8)
        .unwrap()
        .with_palette(&gray(3), 3)
        .into_session()
        .unwrap();
    session.frame_buf().copy_from_slice(&noise(64, 5, 3));
    session.add_frame(20).unwrap();
    session.close().unwrap();
    let data = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    let anim = decode(&data);
    assert_eq!(anim.frames[0].buffer, noise(64, 5, 3));
}

#[test]
fn create_missing_dir() {
    let path = std::env::temp_dir().join("animgif-missing").join("x.gif");
    let res = Encoder::create(&path, 8, 8);
    assert!(matches!(res, Err(Error::StreamOpen(_))));
}
