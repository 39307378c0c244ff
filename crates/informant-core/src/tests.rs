#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::animation::*;
    use crate::*;
    use web_time::{Duration, Instant};

    fn opaque(tree: &mut ViewTree, parent: Option<NodeId>, r: Rect, c: Color) -> NodeId {
        tree.add(parent, r, ViewStyle::filled(c)).unwrap()
    }

    #[test]
    fn test_color_from_hex() {
        let c = Color::from_hex("#FF5733");
        assert_eq!(c, Color(255, 87, 51, 255));

        let c_alpha = Color::from_hex("#FF5733AA");
        assert_eq!(c_alpha, Color(255, 87, 51, 170));
    }

    #[test]
    fn test_color_argb_packing() {
        let c = Color::from_argb(0x80FF0010);
        assert_eq!(c, Color(255, 0, 16, 128));
        assert_eq!(c.to_argb(), 0x80FF0010);
    }

    #[test]
    fn test_over_onto_transparent_keeps_source() {
        let src = Color(200, 100, 50, 128);
        assert_eq!(src.over(Color::TRANSPARENT), src);
        assert_eq!(Color::WHITE.over(Color::BLACK), Color::WHITE);
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect {
            x: 10.0,
            y: 10.0,
            w: 100.0,
            h: 50.0,
        };

        assert!(rect.contains(Vec2 { x: 50.0, y: 30.0 }));
        assert!(!rect.contains(Vec2 { x: 5.0, y: 30.0 }));
        assert!(!rect.contains(Vec2 { x: 50.0, y: 70.0 }));
        assert!(!rect.covers(Vec2 { x: 110.0, y: 30.0 }));
    }

    #[test]
    fn test_transform_invert_roundtrip() {
        let t = Transform::translate(5.0, -3.0)
            .then_scale(2.0, 0.5)
            .concat(&Transform::rotate(0.3));
        let inv = t.invert().unwrap();
        let p = Vec2 { x: 7.0, y: 11.0 };
        let back = inv.apply_to_point(t.apply_to_point(p));
        assert!((back.x - p.x).abs() < 1e-4);
        assert!((back.y - p.y).abs() < 1e-4);
        assert!(Transform::scale(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn test_scale_about_keeps_pivot() {
        let t = Transform::identity().then_scale_about(3.0, 3.0, 10.0, 20.0);
        assert_eq!(t.apply_to_point(Vec2 { x: 10.0, y: 20.0 }), Vec2 { x: 10.0, y: 20.0 });
        assert_eq!(t.apply_to_point(Vec2 { x: 11.0, y: 20.0 }), Vec2 { x: 13.0, y: 20.0 });
    }

    #[test]
    fn test_raster_rejects_degenerate_sizes() {
        assert_eq!(
            Raster::new(0, 10).unwrap_err(),
            Error::Raster {
                width: 0,
                height: 10
            }
        );
        assert!(Raster::new(MAX_RASTER_SIDE + 1, 1).is_err());
        assert!(Raster::for_rect(Rect::from_size(0.4, 3.0)).is_ok());
        assert!(Raster::for_rect(Rect::from_size(0.0, 3.0)).is_err());
    }

    #[test]
    fn test_fill_rect_is_pixel_exact() {
        let mut r = Raster::new(10, 10).unwrap();
        let mut c = Canvas::new(&mut r);
        c.fill_rect(Rect::new(2.0, 3.0, 4.0, 5.0), Color::BLACK);
        assert_eq!(r.coverage(), 20);
        assert_eq!(r.pixel(2, 3), Some(Color::BLACK));
        assert_eq!(r.pixel(5, 7), Some(Color::BLACK));
        assert_eq!(r.pixel(6, 7), Some(Color::TRANSPARENT));
        assert_eq!(r.pixel(5, 8), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_clip_circle_and_restore() {
        let mut r = Raster::new(20, 20).unwrap();
        let mut c = Canvas::new(&mut r);
        c.save();
        c.clip_circle(Vec2 { x: 10.0, y: 10.0 }, 10.0);
        c.draw_paint(Color::WHITE);
        c.restore();
        // corners fall outside the inscribed circle
        assert_eq!(r.pixel(0, 0), Some(Color::TRANSPARENT));
        assert_eq!(r.pixel(19, 19), Some(Color::TRANSPARENT));
        assert_eq!(r.pixel(10, 10), Some(Color::WHITE));
        assert_eq!(r.pixel(10, 0), Some(Color::WHITE));
    }

    #[test]
    fn test_draw_raster_stretches_nearest() {
        let mut src = Raster::new(2, 1).unwrap();
        {
            let mut c = Canvas::new(&mut src);
            c.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::BLACK);
            c.fill_rect(Rect::new(1.0, 0.0, 1.0, 1.0), Color::WHITE);
        }
        let mut dst = Raster::new(8, 2).unwrap();
        let mut c = Canvas::new(&mut dst);
        c.draw_raster(&src, Rect::from_size(8.0, 2.0), &Paint::default());
        assert_eq!(dst.pixel(3, 1), Some(Color::BLACK));
        assert_eq!(dst.pixel(4, 0), Some(Color::WHITE));
    }

    #[test]
    fn test_paint_tint_keeps_coverage() {
        let tint = Paint {
            alpha: 1.0,
            tint: Some(Color::from_rgb(0, 255, 0)),
        };
        assert_eq!(tint.apply(Color(10, 20, 30, 255)), Color(0, 255, 0, 255));
        assert_eq!(tint.apply(Color::TRANSPARENT).3, 0);
        assert_eq!(Paint::with_alpha(0.5).apply(Color::WHITE), Color(255, 255, 255, 128));
    }

    #[test]
    fn test_rect_in_accumulates_offsets() {
        let mut tree = ViewTree::new();
        let root = opaque(&mut tree, None, Rect::new(50.0, 50.0, 100.0, 100.0), Color::BLACK);
        let mid = opaque(&mut tree, Some(root), Rect::new(10.0, 20.0, 50.0, 50.0), Color::WHITE);
        let leaf = opaque(&mut tree, Some(mid), Rect::new(5.0, 5.0, 10.0, 10.0), Color::WHITE);

        assert_eq!(tree.rect_in(root, root), Some(Rect::from_size(100.0, 100.0)));
        assert_eq!(tree.rect_in(root, leaf), Some(Rect::new(15.0, 25.0, 10.0, 10.0)));
        assert_eq!(tree.rect_in(mid, root), None);
    }

    #[test]
    fn test_drawing_order_follows_z_index() {
        let mut tree = ViewTree::new();
        let root = opaque(&mut tree, None, Rect::from_size(10.0, 10.0), Color::BLACK);
        let a = opaque(&mut tree, Some(root), Rect::from_size(5.0, 5.0), Color::WHITE);
        let b = opaque(&mut tree, Some(root), Rect::from_size(5.0, 5.0), Color::WHITE);
        let c = opaque(&mut tree, Some(root), Rect::from_size(5.0, 5.0), Color::WHITE);
        tree.set_z_index(a, 2.0).unwrap();
        assert_eq!(tree.children(root), vec![a, b, c]);
        assert_eq!(tree.drawing_order(root), vec![b, c, a]);
    }

    #[test]
    fn test_view_tree_reparent_and_drop() {
        let mut tree = ViewTree::new();
        let root = opaque(&mut tree, None, Rect::from_size(10.0, 10.0), Color::BLACK);
        let other = opaque(&mut tree, None, Rect::from_size(10.0, 10.0), Color::BLACK);
        let child = opaque(&mut tree, Some(root), Rect::from_size(5.0, 5.0), Color::WHITE);
        tree.insert_child(other, child, None).unwrap();
        assert!(tree.children(root).is_empty());
        assert_eq!(tree.parent(child), Some(other));

        tree.drop_view(other);
        assert!(!tree.contains(child));
        assert_eq!(tree.len(), 1);
        assert_eq!(
            tree.add(Some(other), Rect::default(), ViewStyle::default()),
            Err(Error::Resolution(other))
        );
    }

    #[test]
    fn test_transform_props_order() {
        let props = TransformProps::from_ops(&[
            TransformOp::TranslateX(10.0),
            TransformOp::ScaleX(2.0),
            TransformOp::ScaleX(1.5),
        ]);
        assert_eq!(props.translate_x, 10.0);
        assert_eq!(props.scale_x, 3.0);

        // scale about the center of a 0..10 box, then translate
        let t = props.to_transform(Rect::from_size(10.0, 10.0));
        let p = t.apply_to_point(Vec2 { x: 5.0, y: 5.0 });
        assert!((p.x - 15.0).abs() < 1e-4);
        assert!((p.y - 5.0).abs() < 1e-4);
        let p = t.apply_to_point(Vec2 { x: 6.0, y: 5.0 });
        assert!((p.x - 18.0).abs() < 1e-4);
    }

    #[test]
    fn test_props_delta_builder() {
        let d = PropsDelta::new().opacity(0.5).tint_color(None);
        assert_eq!(d.opacity, Some(0.5));
        assert_eq!(d.tint_color, Some(None));
        assert!(d.transform.is_none());
        assert!(!d.is_empty());
        assert!(PropsDelta::new().is_empty());
    }

    #[test]
    fn test_ui_context_runs_posted_tasks_on_pump() {
        let ui = UiContext::new();
        let tree = ViewTree::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let handle = ui.handle();
        let h2 = handle.clone();
        let hits2 = hits.clone();
        let worker = std::thread::spawn(move || {
            assert!(!h2.is_ui_thread());
            h2.post(move |_tree| {
                hits2.fetch_add(1, Ordering::SeqCst);
            });
        });
        worker.join().unwrap();

        assert!(handle.is_ui_thread());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(handle.pending(), 1);
        assert_eq!(ui.pump(&tree), Ok(1));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(ui.pump(&tree), Ok(0));
    }

    #[test]
    fn test_ui_context_pump_runs_follow_up_tasks() {
        let ui = UiContext::new();
        let tree = ViewTree::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let handle = ui.handle();
        let (h, n) = (handle.clone(), hits.clone());
        handle.post(move |_| {
            let n2 = n.clone();
            h.post(move |_| {
                n2.fetch_add(1, Ordering::SeqCst);
            });
        });
        assert_eq!(ui.pump(&tree), Ok(2));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ui_context_refuses_foreign_pump() {
        let ui = UiContext::new();
        let result = std::thread::spawn(move || ui.pump(&ViewTree::new()))
            .join()
            .unwrap();
        assert_eq!(result, Err(Error::WrongThread));
    }

    #[test]
    fn test_animation_deterministic() {
        let clock = TestClock::new(Instant::now());
        set_clock(clock.clone());

        let mut a = AnimatedValue::new(0.0, AnimationSpec::linear(Duration::from_millis(1000)));
        a.set_target(10.0);
        clock.advance(Duration::from_millis(250));
        assert!(a.update());
        assert!((a.get() - 2.5).abs() < 0.01);

        clock.advance(Duration::from_millis(750));
        let cont = a.update();
        assert!(!cont);
        assert!((a.get() - 10.0).abs() < 0.001);
    }

    #[test]
    fn test_animation_delay_holds_start_value() {
        let clock = TestClock::new(Instant::now());
        set_clock(clock.clone());

        let spec = AnimationSpec::linear(Duration::from_millis(100))
            .with_delay(Duration::from_millis(50));
        let mut a = AnimatedValue::new(1.0, spec);
        a.set_target(2.0);
        clock.advance(Duration::from_millis(40));
        assert!(a.update());
        assert_eq!(a.get(), 1.0);
        clock.advance(Duration::from_millis(60));
        assert!(a.update());
        assert!((a.get() - 1.5).abs() < 1e-3);
    }

    #[test]
    fn test_retarget_starts_from_current_value() {
        let clock = TestClock::new(Instant::now());
        set_clock(clock.clone());

        let mut a = AnimatedValue::new(1.0, AnimationSpec::linear(Duration::from_millis(100)));
        a.set_target(2.0);
        clock.advance(Duration::from_millis(50));
        a.update();
        assert_eq!(a.get(), 1.5);

        a.set_target(1.0);
        assert_eq!(a.target(), 1.0);
        clock.advance(Duration::from_millis(50));
        assert!(a.update());
        assert_eq!(a.get(), 1.25);
        clock.advance(Duration::from_millis(50));
        assert!(!a.update());
        assert_eq!(a.get(), 1.0);
        assert!(!a.is_animating());
    }
}
