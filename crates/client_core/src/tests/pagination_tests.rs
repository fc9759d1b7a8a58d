use super::*;

fn window_with_total(total: u64) -> PageWindow {
    let mut window = PageWindow::default();
    window.set_total(total);
    window
}

#[test]
fn ranges_follow_page_size() {
    let mut window = window_with_total(20);
    assert_eq!(window.range(), RowRange { from: 0, to: 7 });
    window.go_to(3).expect("page 3");
    assert_eq!(window.range(), RowRange { from: 16, to: 23 });
}

#[test]
fn total_pages_rounds_up() {
    assert_eq!(window_with_total(0).total_pages(), 0);
    assert_eq!(window_with_total(1).total_pages(), 1);
    assert_eq!(window_with_total(8).total_pages(), 1);
    assert_eq!(window_with_total(9).total_pages(), 2);
}

#[test]
fn expected_len_matches_window_for_every_page() {
    for total in [1_u64, 7, 8, 9, 16, 17, 23] {
        let mut window = window_with_total(total);
        for page in 1..=window.total_pages() {
            window.go_to(page).expect("page in range");
            let expected = PAGE_SIZE.min(total - (page - 1) * PAGE_SIZE);
            assert_eq!(window.expected_len(), expected, "total={total} page={page}");
            assert_eq!(window.can_prev(), page != 1);
            assert_eq!(window.can_next(), page != window.total_pages());
        }
    }
}

#[test]
fn rejects_page_zero_and_past_last_page() {
    let mut window = window_with_total(9);
    assert_eq!(
        window.go_to(0),
        Err(PageError::OutOfRange {
            requested: 0,
            last_page: 2
        })
    );
    assert!(window.go_to(3).is_err());
    assert_eq!(window.page(), 1);

    assert!(window.prev().is_err());
    window.next().expect("page 2");
    assert!(window.next().is_err());
    assert_eq!(window.page(), 2);
}

#[test]
fn empty_list_keeps_both_controls_disabled() {
    let mut window = window_with_total(0);
    assert!(!window.can_prev());
    assert!(!window.can_next());
    assert_eq!(window.page_numbers().count(), 0);
    window.go_to(1).expect("page 1 is always valid");
    assert_eq!(window.expected_len(), 0);
}

#[test]
fn reset_returns_to_first_page() {
    let mut window = window_with_total(30);
    window.go_to(4).expect("page 4");
    window.reset();
    assert_eq!(window.page(), 1);
}
