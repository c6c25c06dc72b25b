/// Scoped widget styles, injected as a `<style>` element inside each
/// isolated root so the host page's CSS never bleeds in or out.

pub const SEARCH_BAR: &str = "
  .ts-searchbar {
    display: flex;
    gap: 6px;
    align-items: center;
    font-family: system-ui, sans-serif;
  }
  .ts-searchbar-input {
    flex: 1;
    padding: 10px 14px;
    border: 1px solid #ccc;
    border-radius: 6px;
    margin-bottom: 10px;
  }
  .ts-searchbar-btn {
    display: inline-flex;
    align-items: center;
    padding-top: 5px;
    padding-bottom: 5px;
    font-size: 14px;
    border-radius: 7px;
    text-shadow: none;
    text-decoration: none;
    color: #fff;
    background-color: #0c5fab;
    border-color: #0c5fab;
    cursor: pointer;
  }
  .ts-searchbar-btn:hover {
    background: #556cd6;
  }
";

pub const RESPONSE_CARD: &str = "
  .ts-response-card {
    margin: 12px 0;
    padding: 12px 16px;
    border: 1px solid #d8dce3;
    border-radius: 8px;
    background: #f8f9fb;
    font-family: system-ui, sans-serif;
  }
  .ts-response-card-header {
    font-weight: 600;
    margin-bottom: 6px;
  }
  .ts-response-card-content {
    font-size: 14px;
    color: #333;
    white-space: pre-wrap;
  }
";

pub const COMPOSER: &str = "
  .ts-composer-area {
    display: flex;
    gap: 8px;
    margin: 8px 0;
    font-family: system-ui, sans-serif;
  }
  .ts-composer-btn {
    padding: 5px 12px;
    font-size: 13px;
    border-radius: 7px;
    color: #fff;
    background-color: #0c5fab;
    border-color: #0c5fab;
    cursor: pointer;
  }
  .ts-composer-btn:hover {
    background: #556cd6;
  }
";
