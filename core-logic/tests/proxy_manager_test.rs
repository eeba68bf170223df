use core_logic::ProxyManager;
use std::fs;

#[test]
fn test_missing_file_means_no_proxies() {
    let dir = tempfile::tempdir().unwrap();
    let proxies = ProxyManager::load_proxies(dir.path().join("proxies.txt")).unwrap();
    assert!(proxies.is_empty());
}

#[test]
fn test_load_skips_comments_and_bad_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("proxies.txt");
    fs::write(
        &path,
        "# residential\n1.1.1.1:8000\n\nnot-a-proxy\n2.2.2.2:9000:u:p\nsocks5://3.3.3.3:1080\n",
    )
    .unwrap();

    let proxies = ProxyManager::load_proxies(&path).unwrap();
    let urls: Vec<String> = proxies.iter().map(|p| p.to_url()).collect();
    assert_eq!(
        urls,
        vec![
            "http://1.1.1.1:8000",
            "http://u:p@2.2.2.2:9000",
            "socks5://3.3.3.3:1080",
        ]
    );
}
