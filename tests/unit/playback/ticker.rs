use super::*;

#[test]
fn offline_clock_steps_one_frame_per_tick() {
    let mut c = OfflineClock::new(Fps::new(4, 1).unwrap());
    assert_eq!(c.next_tick(), 0.0);
    assert_eq!(c.next_tick(), 0.25);
    assert_eq!(c.next_tick(), 0.5);
    assert_eq!(c.frames(), 3);
}

#[test]
fn loop_stops_on_break() {
    let mut l = AnimationLoop::new(OfflineClock::new(Fps::new(30, 1).unwrap()));
    let mut seen = Vec::new();
    let ticks = l
        .run(|t| {
            seen.push(t);
            Ok(if seen.len() == 5 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            })
        })
        .unwrap();
    assert_eq!(ticks, 5);
    assert_eq!(seen.len(), 5);
    assert!(seen.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn cancelled_token_stops_loop_before_next_tick() {
    let mut l = AnimationLoop::new(OfflineClock::new(Fps::new(30, 1).unwrap()));
    let token = l.token();
    let ticks = l
        .run(|t| {
            if t >= 0.09 {
                token.cancel();
            }
            Ok(ControlFlow::Continue(()))
        })
        .unwrap();
    assert_eq!(ticks, 4);
    assert!(l.token().is_cancelled());
}

#[test]
fn tick_errors_propagate() {
    let mut l = AnimationLoop::new(OfflineClock::new(Fps::new(30, 1).unwrap()));
    let r = l.run(|_| Err(crate::foundation::error::StudioError::validation("stop")));
    assert!(r.is_err());
}

#[test]
fn realtime_clock_is_monotonic() {
    let mut c = RealtimeClock::new(Fps::new(500, 1).unwrap());
    let a = c.next_tick();
    let b = c.next_tick();
    assert!(b >= a);
}
