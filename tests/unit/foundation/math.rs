use super::*;

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn over_opaque_extremes() {
    let dst = [10, 20, 30, 255];
    assert_eq!(over_opaque(dst, [1, 2, 3, 255]), [1, 2, 3, 255]);
    assert_eq!(over_opaque(dst, [200, 200, 200, 0]), [10, 20, 30, 255]);

    let half = over_opaque([0, 0, 0, 255], [255, 255, 255, 128]);
    assert_eq!(half[3], 255);
    assert!(half[0] > 120 && half[0] < 135);
}

#[test]
fn premul_over_opaque_matches_straight_for_opaque_source() {
    let dst = [50, 60, 70, 255];
    assert_eq!(premul_over_opaque(dst, [9, 8, 7, 255]), [9, 8, 7, 255]);
    assert_eq!(premul_over_opaque(dst, [0, 0, 0, 0]), [50, 60, 70, 255]);
}
