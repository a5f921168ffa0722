use korori::viewport::{Letterbox, ViewAdapter};

#[test]
fn fullscreen_toggles_reproduce_identical_transforms() {
    let mut adapter = ViewAdapter::new(640, 480, 640, 480);
    let windowed = *adapter.transforms();

    let first = *adapter.go_fullscreen(2560, 1440);
    assert_eq!(*adapter.go_windowed(), windowed);
    let second = *adapter.go_fullscreen(2560, 1440);

    assert_eq!(first, second);
    assert_eq!(first.letterbox.scale_x.to_bits(), second.letterbox.scale_x.to_bits());
    assert_eq!(first.letterbox.offset_x, 320);
    assert_eq!(first.scissor(), Some((320, 0, 1920, 1440)));
}

#[test]
fn windowed_resize_keeps_a_one_to_one_mapping() {
    let mut adapter = ViewAdapter::new(640, 480, 640, 480);

    let transforms = *adapter.set_screen_dimension(1, 800, 600);

    assert_eq!(transforms.letterbox, Letterbox::full(800, 600));
    assert_eq!(transforms.scissor(), None);
    assert_eq!(adapter.screen_size(), (800, 600));
    assert_eq!(adapter.logical_size(), (640, 480));
}
