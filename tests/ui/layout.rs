use accountdesk::ui::LayoutManager;
use ratatui::layout::Rect;

#[test]
fn test_main_layout_reserves_status_line() {
    let (content, status) = LayoutManager::main_layout(Rect::new(0, 0, 80, 24));
    assert_eq!(status.height, 1);
    assert_eq!(status.y, 23);
    assert_eq!(content.height, 23);
}

#[test]
fn test_centered_rect_lines_fits_small_terminals() {
    let area = Rect::new(0, 0, 40, 10);
    let dialog = LayoutManager::centered_rect_lines(50, 30, area);
    assert!(dialog.height <= area.height);
    assert!(dialog.width <= area.width);
}
